use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open repository")]
    Open,
    #[display("{_0} failed")]
    Command(#[error(not(source))] &'static str),
    /// Some artifacts of a batch were refused; the rest went in.
    #[display("{_0} of {_1} packages not added")]
    Partial(usize, usize),
}
