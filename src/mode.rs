//! Permission strings: parsing `chmod`-style specs into mode bits, and
//! rendering mode bits back for display.
use std::path::Path as StdPath;

#[cfg(feature = "json_schema")]
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::errors::Error;

/// Bit mask for the file type bit fields.
pub const S_IFMT: u32 = 0o170000;
/// Socket.
pub const S_IFSOCK: u32 = 0o140000;
/// Symbolic link.
pub const S_IFLNK: u32 = 0o120000;
/// Regular file.
pub const S_IFREG: u32 = 0o100000;
/// Block device.
pub const S_IFBLK: u32 = 0o060000;
/// Directory.
pub const S_IFDIR: u32 = 0o040000;
/// Character device.
pub const S_IFCHR: u32 = 0o020000;
/// FIFO.
pub const S_IFIFO: u32 = 0o010000;
/// Set-user-ID bit.
pub const S_ISUID: u32 = 0o4000;
/// Set-group-ID bit.
pub const S_ISGID: u32 = 0o2000;
/// Sticky bit.
pub const S_ISVTX: u32 = 0o1000;

const S_IRWXU: u32 = 0o700;
const S_IRWXG: u32 = 0o070;
const S_IRWXO: u32 = 0o007;
const S_IWOTH: u32 = 0o002;
const ANY_EXEC: u32 = 0o111;
const ALL_PERMS: u32 = 0o7777;

/// Selects how permission strings are interpreted.
#[cfg_attr(feature = "json_schema", derive(JsonSchema))]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ModeDialect {
    /// Historical behaviour: octal literals and the `a` who-letter only touch
    /// the user triad, and `g`/`o` are rejected.
    #[default]
    Legacy,

    /// `chmod` semantics: octal literals set all permission bits, every
    /// who-letter is accepted and permissions may use `X`, `s`, `t` or copy
    /// another triad (`g=u`).
    Posix,
}

/// Parse `spec` against `base` using the [`ModeDialect::Legacy`] rules.
///
/// ```rust
/// # use fsops::parse_mode;
/// assert_eq!(parse_mode("755", 0).unwrap(), 0o700);
/// assert_eq!(parse_mode("u+x", 0o644).unwrap(), 0o744);
/// ```
pub fn parse_mode(spec: &str, base: u32) -> Result<u32, Error> {
    ModeDialect::Legacy.parse(spec, base)
}

impl ModeDialect {
    /// Apply the permission string `spec` to `base` and return the new mode.
    ///
    /// `spec` is either an octal literal or comma separated clauses of the
    /// form `who* (op perm*)+`, applied left to right. Bits outside a
    /// clause's who-set keep their value from the running mode.
    pub fn parse(self, spec: &str, base: u32) -> Result<u32, Error> {
        let invalid = || Error::InvalidMode(spec.to_owned());
        if spec.is_empty() {
            return Err(invalid());
        }

        if spec.bytes().all(|b| b.is_ascii_digit()) {
            let value = u32::from_str_radix(spec, 8).map_err(|_| invalid())?;
            if value > ALL_PERMS {
                return Err(invalid());
            }
            let who = match self {
                ModeDialect::Legacy => S_IRWXU,
                ModeDialect::Posix => ALL_PERMS,
            };
            return Ok(apply('=', base, value, who));
        }

        let mut mode = base;
        for clause in spec.split(',') {
            mode = self.parse_clause(clause, mode).ok_or_else(invalid)?;
        }
        Ok(mode)
    }

    fn all_who(self) -> u32 {
        match self {
            ModeDialect::Legacy => S_IRWXU,
            ModeDialect::Posix => S_IRWXU | S_IRWXG | S_IRWXO,
        }
    }

    /// Set-id and sticky bits that belong to the triads in `who`.
    fn special_bits(self, who: u32) -> u32 {
        match self {
            ModeDialect::Legacy => 0,
            ModeDialect::Posix => {
                let mut bits = 0;
                if who & S_IRWXU != 0 {
                    bits |= S_ISUID;
                }
                if who & S_IRWXG != 0 {
                    bits |= S_ISGID;
                }
                if who & S_IRWXO != 0 {
                    bits |= S_ISVTX;
                }
                bits
            }
        }
    }

    fn parse_clause(self, clause: &str, mut mode: u32) -> Option<u32> {
        let mut chars = clause.chars().peekable();

        let mut who = 0;
        while let Some(&c) = chars.peek() {
            who |= match (c, self) {
                ('a', _) => self.all_who(),
                ('u', _) => S_IRWXU,
                ('g', ModeDialect::Posix) => S_IRWXG,
                ('o', ModeDialect::Posix) => S_IRWXO,
                _ => break,
            };
            chars.next();
        }
        if who == 0 {
            who = self.all_who();
        }
        let mask = who | self.special_bits(who);

        let mut saw_op = false;
        while let Some(op) = chars.next() {
            if !matches!(op, '+' | '-' | '=') {
                return None;
            }
            saw_op = true;
            let mut perm = 0;
            while let Some(&c) = chars.peek() {
                perm |= match (c, self) {
                    ('r', _) => 0o444,
                    ('w', _) => 0o222,
                    ('x', _) => 0o111,
                    ('+' | '-' | '=', _) => break,
                    (_, ModeDialect::Legacy) => return None,
                    ('X', _) if mode & S_IFMT == S_IFDIR || mode & ANY_EXEC != 0 => 0o111,
                    ('X', _) => 0,
                    ('s', _) => S_ISUID | S_ISGID,
                    ('t', _) => S_ISVTX,
                    ('u', _) => copy_triad((mode >> 6) & 0o7),
                    ('g', _) => copy_triad((mode >> 3) & 0o7),
                    ('o', _) => copy_triad(mode & 0o7),
                    _ => return None,
                };
                chars.next();
            }
            mode = apply(op, mode, perm, mask);
        }
        saw_op.then_some(mode)
    }
}

/// Spread one `rwx` triad over all three.
fn copy_triad(triad: u32) -> u32 {
    triad << 6 | triad << 3 | triad
}

fn apply(op: char, mode: u32, perm: u32, mask: u32) -> u32 {
    let perm = perm & mask;
    match op {
        '=' => (mode & !mask) | perm,
        '+' => mode | perm,
        _ => mode & !perm,
    }
}

/// Render the permission bits of `mode` as `rwxrwxrwx`, without the leading
/// file type character.
///
/// ```rust
/// # use fsops::render_mode;
/// assert_eq!(render_mode(0o755), "rwxr-xr-x");
/// assert_eq!(render_mode(0o1777), "rwxrwxrwt");
/// ```
pub fn render_mode(mode: u32) -> String {
    let mut out = String::with_capacity(9);
    for (shift, special, marker) in [(6, S_ISUID, 's'), (3, S_ISGID, 's'), (0, S_ISVTX, 't')] {
        let triad = (mode >> shift) & 0o7;
        out.push(if triad & 0o4 != 0 { 'r' } else { '-' });
        out.push(if triad & 0o2 != 0 { 'w' } else { '-' });
        out.push(match (triad & 0o1 != 0, mode & special != 0) {
            (true, true) => marker,
            (false, true) => marker.to_ascii_uppercase(),
            (true, false) => 'x',
            (false, false) => '-',
        });
    }
    out
}

/// Two-letter classification of `mode`, in the vocabulary of `LS_COLORS`.
///
/// `path` is only consulted for symlinks, to tell a live link (`ln`) from
/// an orphan (`or`). Regular files without any execute bit yield `""`.
pub fn file_code<P: AsRef<StdPath>>(path: P, mode: u32) -> &'static str {
    match mode & S_IFMT {
        S_IFDIR => {
            let other_writable = mode & S_IWOTH != 0;
            match (mode & S_ISVTX != 0, other_writable) {
                (true, true) => "tw",
                (false, true) => "ow",
                (true, false) => "st",
                (false, false) => "di",
            }
        }
        S_IFLNK => {
            if std::fs::metadata(path.as_ref()).is_ok() {
                "ln"
            } else {
                "or"
            }
        }
        S_IFSOCK => "so",
        S_IFIFO => "pi",
        S_IFBLK => "bd",
        S_IFCHR => "cd",
        _ if mode & ANY_EXEC != 0 => {
            if mode & S_ISUID != 0 {
                "su"
            } else if mode & S_ISGID != 0 {
                "sg"
            } else {
                "ex"
            }
        }
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octal_is_scoped_to_user_bits() {
        assert_eq!(parse_mode("755", 0).unwrap(), 0o700);
        assert_eq!(parse_mode("644", 0o077).unwrap(), 0o677);
        assert_eq!(parse_mode("0", 0o755).unwrap(), 0o055);
    }

    #[test]
    fn octal_rejects_bad_literals() {
        assert_eq!(
            parse_mode("789", 0).unwrap_err(),
            Error::InvalidMode("789".into())
        );
        assert!(parse_mode("77777", 0).is_err());
        assert!(parse_mode("99999999999999999999", 0).is_err());
    }

    #[test]
    fn symbolic_user_clauses() {
        assert_eq!(parse_mode("u+x", 0o644).unwrap(), 0o744);
        assert_eq!(parse_mode("u-w", 0o644).unwrap(), 0o444);
        assert_eq!(parse_mode("u=r", 0o755).unwrap(), 0o455);
        assert_eq!(parse_mode("a+rwx", 0).unwrap(), 0o700);
        assert_eq!(parse_mode("+x", 0o600).unwrap(), 0o700);
        assert_eq!(parse_mode("u=", 0o755).unwrap(), 0o055);
    }

    #[test]
    fn clauses_compose_left_to_right() {
        assert_eq!(parse_mode("u=rw,u+x", 0).unwrap(), 0o700);
        assert_eq!(parse_mode("u+rwx-w", 0).unwrap(), 0o500);
        assert_eq!(parse_mode("u=rwx,u-x", 0o044).unwrap(), 0o644);
    }

    #[test]
    fn legacy_rejects_group_and_other() {
        assert!(parse_mode("g+w", 0o644).is_err());
        assert!(parse_mode("o-r", 0o644).is_err());
    }

    #[test]
    fn invalid_operators_and_letters() {
        for spec in ["", "u", "u*x", "uq+x", "u+z", "u+x,", ",u+x"] {
            assert!(
                matches!(parse_mode(spec, 0), Err(Error::InvalidMode(_))),
                "{spec:?} should be rejected"
            );
        }
    }

    #[test]
    fn posix_dialect() {
        let posix = ModeDialect::Posix;
        assert_eq!(posix.parse("755", 0).unwrap(), 0o755);
        assert_eq!(posix.parse("go-w", 0o666).unwrap(), 0o644);
        assert_eq!(posix.parse("a+x", 0o644).unwrap(), 0o755);
        assert_eq!(posix.parse("u=rwx,g=rx,o=", 0).unwrap(), 0o750);
        assert_eq!(posix.parse("4755", 0).unwrap(), 0o4755);
    }

    #[test]
    fn posix_special_bits() {
        let posix = ModeDialect::Posix;
        assert_eq!(posix.parse("u+s", 0o755).unwrap(), 0o4755);
        assert_eq!(posix.parse("g+s", 0o755).unwrap(), 0o2755);
        assert_eq!(posix.parse("+t", 0o755).unwrap(), 0o1755);
        assert_eq!(posix.parse("o+s", 0o755).unwrap(), 0o755);
        assert_eq!(posix.parse("u+t", 0o755).unwrap(), 0o755);
        assert_eq!(posix.parse("u=rwx", 0o4755).unwrap(), 0o755);
        assert_eq!(posix.parse("a-s", 0o6755).unwrap(), 0o755);
    }

    #[test]
    fn posix_conditional_execute() {
        let posix = ModeDialect::Posix;
        assert_eq!(
            posix.parse("a+X", S_IFDIR | 0o644).unwrap(),
            S_IFDIR | 0o755
        );
        assert_eq!(
            posix.parse("a+X", S_IFREG | 0o644).unwrap(),
            S_IFREG | 0o644
        );
        assert_eq!(
            posix.parse("a+X", S_IFREG | 0o744).unwrap(),
            S_IFREG | 0o755
        );
    }

    #[test]
    fn posix_copies_triads() {
        let posix = ModeDialect::Posix;
        assert_eq!(posix.parse("g=u", 0o740).unwrap(), 0o770);
        assert_eq!(posix.parse("o=g", 0o750).unwrap(), 0o755);
        assert_eq!(posix.parse("go=u-w", 0o640).unwrap(), 0o644);
    }

    #[test]
    fn legacy_rejects_extended_permissions() {
        for spec in ["u+s", "+t", "a+X", "u=u"] {
            assert!(parse_mode(spec, 0o755).is_err(), "{spec:?}");
        }
    }

    #[test]
    fn type_bits_survive_parsing() {
        assert_eq!(
            parse_mode("u+x", S_IFREG | 0o644).unwrap(),
            S_IFREG | 0o744
        );
    }

    #[test]
    fn render_permission_triads() {
        assert_eq!(render_mode(0o755), "rwxr-xr-x");
        assert_eq!(render_mode(0o644), "rw-r--r--");
        assert_eq!(render_mode(0), "---------");
        assert_eq!(render_mode(S_IFDIR | 0o700), "rwx------");
        assert_eq!(render_mode(0o4755), "rwsr-xr-x");
        assert_eq!(render_mode(0o2644), "rw-r-Sr--");
        assert_eq!(render_mode(0o1776), "rwxrwxrwT");
    }

    #[test]
    fn directory_codes() {
        assert_eq!(file_code("d", S_IFDIR | 0o1777), "tw");
        assert_eq!(file_code("d", S_IFDIR | 0o777), "ow");
        assert_eq!(file_code("d", S_IFDIR | 0o1755), "st");
        assert_eq!(file_code("d", S_IFDIR | 0o755), "di");
    }

    #[test]
    fn regular_file_codes() {
        assert_eq!(file_code("f", S_IFREG | 0o755), "ex");
        assert_eq!(file_code("f", 0o700), "ex");
        assert_eq!(file_code("f", S_IFREG | 0o4755), "su");
        assert_eq!(file_code("f", S_IFREG | 0o2755), "sg");
        assert_eq!(file_code("f", S_IFREG | 0o644), "");
    }

    #[test]
    fn special_file_codes() {
        assert_eq!(file_code("s", S_IFSOCK | 0o755), "so");
        assert_eq!(file_code("p", S_IFIFO | 0o644), "pi");
        assert_eq!(file_code("b", S_IFBLK | 0o660), "bd");
        assert_eq!(file_code("c", S_IFCHR | 0o620), "cd");
    }

    #[test]
    fn symlink_codes_check_target() {
        assert_eq!(file_code("Cargo.toml", S_IFLNK | 0o777), "ln");
        assert_eq!(file_code("no/such/target", S_IFLNK | 0o777), "or");
    }
}
