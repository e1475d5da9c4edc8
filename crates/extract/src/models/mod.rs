mod metadata;
mod record;

pub use self::metadata::Metadata;
pub use self::record::Record;
