use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("catalog store error")]
    Store,
    #[display("synchronisation failed")]
    Sync,
    #[display("cannot read catalog record")]
    Catalog,
    #[display("no stored record with id {_0}")]
    NotFound(#[error(not(source))] String),
    #[display("cannot write output")]
    Output,
}
