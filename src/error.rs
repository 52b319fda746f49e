use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageletError {
    #[error("Runtime error: {0}")]
    Runtime(#[from] pagelet::RuntimeError),

    #[error("Stylesheet allocation error: {0}")]
    Alloc(#[from] stylepack::AllocError),
}

pub type Result<T> = std::result::Result<T, PageletError>;
