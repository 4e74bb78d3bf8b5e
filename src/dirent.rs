use crate::Error;
use crate::ErrorPolicy;
use crate::FileKind;
use crate::backend::FsBackend;

/// Turn the kind reported by a directory scan into a concrete one.
///
/// Scans on some filesystems cannot tell what an entry is and report
/// [`FileKind::Unknown`]; only then is `path` link-stat'ed. When that stat
/// fails, `policy` decides between returning the error and recording it in
/// `warnings` while answering [`FileKind::Unknown`].
pub fn resolve<B: FsBackend + ?Sized>(
    backend: &B,
    path: &str,
    raw: FileKind,
    policy: ErrorPolicy,
    warnings: &mut Vec<Error>,
) -> Result<FileKind, Error> {
    if raw != FileKind::Unknown {
        return Ok(raw);
    }
    match backend.link_stat(path) {
        Ok(stat) => Ok(FileKind::from_mode(stat.mode)),
        Err(e) => {
            let err = Error::from_io(format!("stat '{path}'"), e);
            match policy {
                ErrorPolicy::Fail => Err(err),
                ErrorPolicy::WarnAndSkip => {
                    log::warn!("{err}");
                    warnings.push(err);
                    Ok(FileKind::Unknown)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::test_support::MemoryFs;

    fn fs() -> MemoryFs {
        MemoryFs::new()
            .dir("root", &[("known", FileKind::File), ("mystery", FileKind::Unknown)])
            .stat_as("root/mystery", FileKind::Dir)
    }

    #[test]
    fn known_kind_skips_stat() {
        let fs = fs();
        let mut warnings = vec![];
        let kind = resolve(&fs, "root/known", FileKind::File, ErrorPolicy::Fail, &mut warnings);
        assert_eq!(kind.unwrap(), FileKind::File);
        assert_eq!(fs.stat_calls(), 0);
    }

    #[test]
    fn unknown_kind_is_stat_resolved() {
        let fs = fs();
        let mut warnings = vec![];
        let kind = resolve(
            &fs,
            "root/mystery",
            FileKind::Unknown,
            ErrorPolicy::Fail,
            &mut warnings,
        );
        assert_eq!(kind.unwrap(), FileKind::Dir);
        assert_eq!(fs.stat_calls(), 1);
        assert!(warnings.is_empty());
    }

    #[test]
    fn stat_failure_follows_policy() {
        let fs = fs();
        let mut warnings = vec![];
        let err = resolve(
            &fs,
            "root/gone",
            FileKind::Unknown,
            ErrorPolicy::Fail,
            &mut warnings,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(warnings.is_empty());

        let kind = resolve(
            &fs,
            "root/gone",
            FileKind::Unknown,
            ErrorPolicy::WarnAndSkip,
            &mut warnings,
        );
        assert_eq!(kind.unwrap(), FileKind::Unknown);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind(), ErrorKind::NotFound);
    }
}
