use super::{SHARPEN_IMAGE, SHARPEN_KERNEL, fixture_4x4_input, fixture_4x4_kernel, fixture_4x4_output};
use crate::assert_err;
use crate::conv::{BackendKind, Conv2dEngine, ConvBackend, ConvConfig, DirectConv, FastConv, backward, forward};
use crate::errors::ConvError;
use crate::tensor::Tensor;

#[test]
fn test_config_default_and_json() -> Result<(), ConvError> {
    let config = ConvConfig::default();
    assert_eq!(config, ConvConfig::new(0, 1, BackendKind::Fast));

    let config = ConvConfig::from_json(r#"{"padding": 1, "stride": 2, "backend": "direct"}"#)?;
    assert_eq!(config, ConvConfig::new(1, 2, BackendKind::Direct));

    // 缺省字段取默认值
    let config = ConvConfig::from_json(r#"{"padding": 2}"#)?;
    assert_eq!(config, ConvConfig::new(2, 1, BackendKind::Fast));

    let json = config.to_json()?;
    assert!(json.contains("\"backend\": \"fast\""));
    assert_eq!(ConvConfig::from_json(&json)?, config);
    Ok(())
}

#[test]
fn test_invalid_config() {
    assert_err!(
        ConvConfig::from_json(r#"{"stride": 0}"#),
        ConvError::InvalidConfig("stride须≥1")
    );
    // 负数无法表示为无符号整数
    assert_err!(ConvConfig::from_json(r#"{"padding": -1}"#), ConvError::InvalidConfig(_));
    assert_err!(ConvConfig::from_json(r#"{"backend": "winograd"}"#), ConvError::InvalidConfig(_));
    assert_err!(ConvConfig::from_json("not json"), ConvError::InvalidConfig(_));
}

#[test]
fn test_backend_kind_into_backend() {
    assert_eq!(ConvBackend::from(BackendKind::Direct), ConvBackend::Direct(DirectConv));
    assert_eq!(ConvBackend::from(BackendKind::Fast), ConvBackend::Fast(FastConv));
}

#[test]
fn test_engine_both_backends_on_fixtures() -> Result<(), ConvError> {
    for backend in [BackendKind::Direct, BackendKind::Fast] {
        let engine = Conv2dEngine::new(ConvConfig::new(1, 1, backend));
        let output = engine.forward(&fixture_4x4_input(), &fixture_4x4_kernel())?;
        assert_eq!(output, fixture_4x4_output());

        let engine = Conv2dEngine::new(ConvConfig::new(1, 2, backend));
        let input = Tensor::new(&SHARPEN_IMAGE, &[1, 1, 4, 5]);
        let kernel = Tensor::new(&SHARPEN_KERNEL, &[1, 1, 3, 3]);
        let output = engine.forward(&input, &kernel)?;
        assert_eq!(output, Tensor::new(&[9., 32., 21., 29., 8., 0.], &[1, 1, 2, 3]));
    }
    Ok(())
}

#[test]
fn test_three_channel_image_with_single_channel_kernel() {
    let mut data = SHARPEN_IMAGE.to_vec();
    data.extend(SHARPEN_IMAGE);
    data.extend(SHARPEN_IMAGE);
    let input = Tensor::new(&data, &[1, 3, 4, 5]);
    let kernel = Tensor::new(&SHARPEN_KERNEL, &[1, 1, 3, 3]);
    assert_err!(
        forward(&input, &kernel, 1, 2),
        ConvError::ShapeError([3], [1], "输入通道数 3 与卷积核输入通道数 1 不匹配")
    );
}

#[test]
fn test_free_functions_validate_upstream() {
    let input = fixture_4x4_input();
    let kernel = fixture_4x4_kernel();
    let output = forward(&input, &kernel, 1, 1).unwrap();
    assert_eq!(output.shape(), &[1, 1, 4, 4]);

    assert!(backward(&input, &kernel, &output, 1, 1).is_ok());
    assert_err!(
        backward(&input, &kernel, &Tensor::ones(&[1, 1, 2, 2]), 1, 1),
        ConvError::DimensionMismatch(vec![1, 1, 4, 4], vec![1, 1, 2, 2])
    );
    assert_err!(
        forward(&input, &kernel, 0, 0),
        ConvError::ShapeError { .. }
    );
}
