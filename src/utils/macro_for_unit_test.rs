/// 断言`Result`为`Err(ConvError::..)`，并按需校验其中的字段
///
/// ```ignore
/// assert_err!(result);                                            // 任意错误
/// assert_err!(result, ConvError::InvalidConfig("stride须≥1"));     // 配置错误 + 完整消息
/// assert_err!(result, ConvError::ShapeError([3], [1], "消息"));    // expected, got, message
/// assert_err!(result, ConvError::DimensionMismatch(vec![1, 2, 3, 3], vec![1, 2, 3, 2]));
/// assert_err!(result, ConvError::ShapeError { got, .. } if got == &[1, 4, 4]);
/// ```
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        assert!($expr.is_err(), "预期 Err，实际得到 {:?}", $expr);
    };
    ($expr:expr, $err_type:ident :: InvalidConfig ( $msg:literal )) => {
        match &$expr {
            Err($err_type::InvalidConfig(actual)) => {
                assert_eq!(actual, $msg, "配置错误的消息不符")
            }
            other => panic!("预期 Err(InvalidConfig({:?}))，实际得到 {:?}", $msg, other),
        }
    };
    ($expr:expr, $err_type:ident :: ShapeError ( $exp:expr, $got:expr, $msg:expr )) => {
        match &$expr {
            Err($err_type::ShapeError { expected, got, message }) => {
                assert_eq!(expected.as_slice(), &$exp, "ShapeError.expected 不符");
                assert_eq!(got.as_slice(), &$got, "ShapeError.got 不符");
                assert_eq!(message, $msg, "ShapeError.message 不符");
            }
            other => panic!("预期 Err(ShapeError)，实际得到 {:?}", other),
        }
    };
    ($expr:expr, $err_type:ident :: DimensionMismatch ( $exp:expr, $got:expr )) => {
        match &$expr {
            Err($err_type::DimensionMismatch { expected, got }) => {
                assert_eq!(*expected, $exp, "DimensionMismatch.expected 不符");
                assert_eq!(*got, $got, "DimensionMismatch.got 不符");
            }
            other => panic!("预期 Err(DimensionMismatch)，实际得到 {:?}", other),
        }
    };
    // 其余情况按模式匹配，可带 if 条件
    ($expr:expr, $($pattern:tt)+) => {
        match &$expr {
            Err(e) => assert!(
                matches!(e, $($pattern)+),
                "错误不匹配 `{}`：{:?}",
                stringify!($($pattern)+),
                e
            ),
            Ok(v) => panic!("预期 Err 匹配 `{}`，实际得到 Ok({:?})", stringify!($($pattern)+), v),
        }
    };
}

/// 断言表达式会panic；给出第二个参数时还要求panic消息与其`to_string()`完全一致
#[macro_export]
macro_rules! assert_panic {
    ($expr:expr) => {
        assert!(
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $expr)).is_err(),
            "表达式没有触发panic"
        );
    };
    ($expr:expr, $expected_msg:expr) => {{
        let err = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $expr))
            .err()
            .unwrap_or_else(|| panic!("表达式没有触发panic"));
        let expected = $expected_msg.to_string();
        let actual = err
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| err.downcast_ref::<&'static str>().map(|s| s.to_string()))
            .unwrap_or_else(|| panic!("panic负载不是字符串，预期消息为: {expected}"));
        assert_eq!(actual, expected, "panic消息与预期不符");
    }};
}
