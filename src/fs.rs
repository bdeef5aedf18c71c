use std::time::SystemTime;

/// MTime info gathered for a file.  This also models "file is absent".
/// It's not using an Option<> just because it makes the code using it easier
/// to follow.
///
/// The ordering puts Missing before every Stamp, so a missing file never
/// counts as newer than anything.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MTime {
    Missing,
    Stamp(SystemTime),
}

impl MTime {
    pub fn exists(&self) -> bool {
        matches!(self, MTime::Stamp(_))
    }
}

pub trait FileSystem {
    /// stat() an on-disk path, producing its MTime.
    /// A path that doesn't exist is Ok(MTime::Missing), not an error.
    fn stat(&self, path: &str) -> std::io::Result<MTime>;
}

#[derive(Default)]
pub struct RealFileSystem {}
impl RealFileSystem {
    pub fn new() -> Self {
        RealFileSystem {}
    }
}

impl FileSystem for RealFileSystem {
    fn stat(&self, path: &str) -> std::io::Result<MTime> {
        Ok(match std::fs::metadata(path) {
            Ok(meta) => MTime::Stamp(meta.modified()?),
            Err(err) => {
                if err.kind() == std::io::ErrorKind::NotFound {
                    MTime::Missing
                } else {
                    return Err(err);
                }
            }
        })
    }
}
