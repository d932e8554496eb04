use hardhat_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("console error: {0}")]
    Io(#[from] std::io::Error),
}
