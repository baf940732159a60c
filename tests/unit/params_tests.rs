// Parameter parsing and options building through the public API

use std::collections::HashMap;

use image_service::transform::params::{parse_param, ALLOWED_PARAMS};
use image_service::transform::{
    parse_params, parse_query_string, Angle, ColorSpec, CropSpec, FitMode, ImageType, ParamKind,
    ParamValue, TransformOptions,
};
use rstest::rstest;

#[rstest]
#[case("800", 800)]
#[case("abc", 0)]
#[case("-5", 5)]
#[case("2.5", 3)]
#[case("2.4", 2)]
#[case("", 0)]
#[case("1e3", 1000)]
#[case("NaN", 0)]
#[case("inf", 0)]
fn test_int_values(#[case] raw: &str, #[case] expected: u32) {
    assert_eq!(parse_param(raw, ParamKind::Int), ParamValue::Int(expected));
}

#[rstest]
#[case("1.5", 1.5)]
#[case("-2", 2.0)]
#[case("x", 0.0)]
fn test_float_values(#[case] raw: &str, #[case] expected: f64) {
    assert_eq!(parse_param(raw, ParamKind::Float), ParamValue::Float(expected));
}

#[rstest]
#[case("255,0,0", vec![255, 0, 0])]
#[case("#f00", vec![255, 0, 0])]
#[case("00ff00", vec![0, 255, 0])]
#[case("red", vec![255, 0, 0])]
#[case("notacolor", vec![])]
#[case("1,2", vec![])]
#[case("300, x ,7", vec![255, 0, 7])]
#[case("", vec![])]
fn test_color_values(#[case] raw: &str, #[case] expected: Vec<u8>) {
    assert_eq!(
        parse_param(raw, ParamKind::Color),
        ParamValue::Color(ColorSpec::new(expected))
    );
}

#[rstest]
#[case("10,20,0,0", CropSpec { width: 10, height: 20, x: 0, y: 0 })]
#[case("1,2,3", CropSpec::NONE)]
#[case("1,2,3,x", CropSpec::NONE)]
#[case("", CropSpec::NONE)]
fn test_crop_values(#[case] raw: &str, #[case] expected: CropSpec) {
    assert_eq!(parse_param(raw, ParamKind::Crop), ParamValue::Crop(expected));
}

#[rstest]
#[case("90", Angle::D90)]
#[case("270", Angle::D270)]
#[case("45", Angle::D0)]
fn test_orientation_values(#[case] raw: &str, #[case] expected: Angle) {
    assert_eq!(
        parse_param(raw, ParamKind::Orientation),
        ParamValue::Orientation(expected)
    );
}

#[rstest]
#[case("webp", ImageType::Webp)]
#[case("JPG", ImageType::Jpeg)]
#[case("bmp", ImageType::Unknown)]
fn test_format_values(#[case] raw: &str, #[case] expected: ImageType) {
    assert_eq!(parse_param(raw, ParamKind::Format), ParamValue::Format(expected));
}

#[test]
fn test_parse_params_covers_every_key() {
    let params = parse_params(&HashMap::new());
    assert_eq!(params.len(), ALLOWED_PARAMS.len());
    for (key, _) in ALLOWED_PARAMS {
        assert!(params.contains_key(key), "missing key {}", key);
    }
}

#[test]
fn test_unknown_keys_are_ignored() {
    let query = parse_query_string("w=10&evil=1&h=20");
    let params = parse_params(&query);
    assert!(!params.contains_key("evil"));
    assert_eq!(params["w"], ParamValue::Int(10));
}

#[test]
fn test_query_string_decoding() {
    let query = parse_query_string("?bg=%23ff0000&fm=png&w=1&w=2&name=a+b");
    assert_eq!(query["bg"], "#ff0000");
    assert_eq!(query["w"], "1");
    assert_eq!(query["name"], "a b");
}

#[test]
fn test_options_from_full_query() {
    let options = TransformOptions::from_query_string(
        "w=800&h=600&fit=cover&dpr=2&q=70&fm=webp&or=180&crop=100,50,10,20&bg=white&blur=3&pixel=4",
    );

    assert_eq!(options.width, 800);
    assert_eq!(options.height, 600);
    assert_eq!(options.fit, FitMode::Cover);
    assert_eq!(options.dpr, 2.0);
    assert_eq!(options.quality, 70);
    assert_eq!(options.format, ImageType::Webp);
    assert_eq!(options.orientation, Angle::D180);
    assert_eq!(
        options.crop,
        CropSpec {
            width: 100,
            height: 50,
            x: 10,
            y: 20
        }
    );
    assert_eq!(options.background.rgb(), Some([255, 255, 255]));
    assert_eq!(options.blur, 3);
    assert_eq!(options.pixelate, 4);
    assert!(options.has_transformations());
}

#[test]
fn test_empty_query_yields_defaults() {
    let options = TransformOptions::from_query_string("");
    assert_eq!(options, TransformOptions::default());
    assert!(!options.has_transformations());
    assert!(!options.crop.is_applicable());
    assert!(options.background.is_empty());
}
