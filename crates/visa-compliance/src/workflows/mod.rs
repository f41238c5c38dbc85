pub mod visa;
