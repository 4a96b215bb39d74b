use std::convert::Infallible;

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response};

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod routes;
pub mod utils;

/// Request as seen by handlers: the body has already been collected (and
/// size-limited) at the service boundary.
pub type HttpRequest = Request<Bytes>;

pub type HttpResponse = Response<BoxBody<Bytes, Infallible>>;
