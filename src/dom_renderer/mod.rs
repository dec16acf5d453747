pub mod dom;

pub use dom::DomPage;
