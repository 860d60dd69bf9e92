//! Process exit codes, following the BSD `sysexits.h` values.

use crate::error::ErrorKind;

pub const EXIT_DATAERR: i32 = 65;
pub const EXIT_NOINPUT: i32 = 66;
pub const EXIT_OSERR: i32 = 71;
pub const EXIT_CANTCREAT: i32 = 73;
pub const EXIT_IOERR: i32 = 74;
pub const EXIT_CONFIG: i32 = 78;
/// clap's status for bad arguments
pub const EXIT_USAGE: i32 = 2;

pub fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::InputOpen => EXIT_NOINPUT,
        ErrorKind::OutputOpen => EXIT_CANTCREAT,
        ErrorKind::Allocation => EXIT_OSERR,
        ErrorKind::DecodeHeader | ErrorKind::DimensionMismatch => EXIT_DATAERR,
        ErrorKind::DecodeRead | ErrorKind::EncodeWrite => EXIT_IOERR,
    }
}
