mod common;
mod routing;
mod schema;
