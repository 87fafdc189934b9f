/// Builds a `Vec<Value>` from `name => data` pairs.
///
/// Each pair becomes a [`Value`](crate::Value) through the `From`
/// conversions on [`ValueData`](crate::ValueData), so plain Rust literals
/// pick their natural kinds (`i32` ⇒ `Int`, `&str` ⇒ `String`, `Vec<Value>`
/// ⇒ `Container`, ...).
///
/// # Examples
///
/// ```rust
/// use valuepack::{values, ValueKind};
///
/// let values = values! {
///     "count" => 42,
///     "label" => "x",
/// };
/// assert_eq!(values.len(), 2);
/// assert_eq!(values[0].kind(), ValueKind::Int);
/// ```
#[macro_export]
macro_rules! values {
    // Handle empty list
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };

    // Handle name => data pairs with optional trailing comma
    ($($name:expr => $data:expr),+ $(,)?) => {
        vec![$($crate::Value::new($name, $data)),+]
    };
}

#[cfg(test)]
mod tests {
    use crate::{Value, ValueData, ValueKind};

    #[test]
    fn test_values_macro_empty() {
        let values = values! {};
        assert!(values.is_empty());
    }

    #[test]
    fn test_values_macro_scalars() {
        let values = values! {
            "count" => 42,
            "label" => "x",
            "ratio" => 0.5f32,
            "armed" => true,
        };
        assert_eq!(values.len(), 4);
        assert_eq!(values[0].name(), "count");
        assert_eq!(values[0].kind(), ValueKind::Int);
        assert_eq!(values[1].as_str(), Some("x"));
        assert_eq!(values[2].kind(), ValueKind::Float);
        assert_eq!(values[3].data(), &ValueData::Bool(true));
    }

    #[test]
    fn test_values_macro_wide_integers() {
        let values = values! { "big" => 7i64, "ubig" => 7u64 };
        assert_eq!(values[0].kind(), ValueKind::LLong);
        assert_eq!(values[1].kind(), ValueKind::ULLong);
    }

    #[test]
    fn test_values_macro_composites() {
        let values = values! {
            "group" => vec![Value::int("a", 1), Value::int("b", 2)],
            "raw" => vec![0u8, 1, 2],
        };
        assert_eq!(values[0].kind(), ValueKind::Container);
        assert_eq!(values[0].child_count(), 2);
        assert_eq!(values[1].kind(), ValueKind::Bytes);
    }

    #[test]
    fn test_values_macro_accepts_expressions() {
        let name = format!("v{}", 1);
        let values = values! { name => 2 + 5 };
        assert_eq!(values[0].name(), "v1");
        assert_eq!(values[0].to_int().unwrap(), 7);
    }
}
