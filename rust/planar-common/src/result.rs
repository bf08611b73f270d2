pub type Result<T> = std::result::Result<T, crate::error::Error>;

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
    use crate::error::ErrorKind;

    fn check(width: usize, stride: usize) -> crate::Result<()> {
        crate::verify_arg!(stride, stride >= width);
        Ok(())
    }

    #[test]
    fn test_verify_arg_passes() {
        assert!(check(4, 8).is_ok());
        assert!(check(4, 4).is_ok());
    }

    #[test]
    fn test_verify_arg_fails_with_stringified_condition() {
        let err = check(8, 4).unwrap_err();
        match err.kind() {
            ErrorKind::InvalidArgument { name, message } => {
                assert_eq!(name, "stride");
                assert_eq!(message, "stride >= width");
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }
}
