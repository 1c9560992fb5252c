use std::io;

/// Returns the name this machine reports for itself.
///
/// Names that are not valid UTF-8 are converted lossily.
pub fn hostname() -> io::Result<String> {
    let name = ::hostname::get()?;
    Ok(name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_is_readable() {
        let name = hostname().unwrap();
        assert!(!name.contains('\0'));
    }
}
