use thiserror::Error;

#[derive(Debug, Error)]
pub enum Status {
    #[error("Bad config file version {0}, we want {1}.")]
    BadFileVersion(usize, usize),
    #[error("Invalid tick {0}ms, must be at least 1.")]
    BadTick(u64),
    #[error("Invalid listen address {0}.")]
    BadListen(String),
    #[error("Can not read alerts from {0}: {1}")]
    UnreadableInput(String, String),
    #[error("Can not write {0}: {1}")]
    CantWrite(String, String),
}
