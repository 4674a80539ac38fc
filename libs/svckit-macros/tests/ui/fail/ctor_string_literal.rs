use svckit::hosted_service;

#[hosted_service(ctor = "Ticker::new()")]
pub struct Ticker;

fn main() {}
