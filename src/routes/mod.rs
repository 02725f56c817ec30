pub mod mongo;
pub mod pages;
