pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Returns an `InvalidArgument` error from the enclosing function when
/// `$expr` evaluates to `false`.
#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked_len(size: usize) -> Result<usize> {
        crate::verify_arg!(size, size <= 16);
        Ok(size)
    }

    #[test]
    fn test_verify_arg_macro() {
        assert_eq!(checked_len(16).unwrap(), 16);
        let err = checked_len(17).unwrap_err();
        assert_eq!(err.to_string(), "invalid argument size: size <= 16");
    }
}
