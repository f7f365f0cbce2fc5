//! End-to-end calls through the bridge with the bundled halftone engine.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{GrayImage, ImageFormat, Luma};
use qart_core::{generate, BridgeError, HalftoneEngine, Value};
use std::io::Cursor;

fn reference_png() -> Vec<u8> {
    let img = GrayImage::from_fn(64, 64, |x, _| Luma([(x * 4) as u8]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn decode_envelope_image(encoded: &str) -> GrayImage {
    let bytes = STANDARD.decode(encoded).unwrap();
    image::load_from_memory(&bytes).unwrap().into_luma8()
}

#[test]
fn plain_call_produces_png() {
    let engine = HalftoneEngine::new();
    let args = [
        Value::from("https://example.com"),
        Value::bag([
            ("version", Value::from(0)),
            ("mask", Value::from(0)),
            ("scale", Value::from(4)),
            ("rotation", Value::from(0)),
        ]),
    ];

    let envelope = generate(&engine, &args).unwrap();
    assert!(envelope.success);
    assert!(!envelope.base64_encoded_image.is_empty());

    let img = decode_envelope_image(&envelope.base64_encoded_image);
    assert_eq!(img.width(), img.height());
    assert_eq!(img.width() % 4, 0);
}

#[test]
fn halftone_from_bag_and_positional() {
    let engine = HalftoneEngine::with_seed(1);
    let png = reference_png();
    let options = Value::bag([
        ("scale", Value::from(6)),
        ("dither", Value::Bool(true)),
        ("brightness", Value::from(10)),
        ("contrast", Value::from(20)),
        ("halftoneBase64", Value::from(STANDARD.encode(&png))),
    ]);

    let from_bag = generate(&engine, &[Value::from("qart"), options.clone()]).unwrap();
    let from_both = generate(
        &engine,
        &[Value::from("qart"), options.clone(), Value::Bytes(png.clone())],
    )
    .unwrap();
    // Same image either way, so the seeded output matches
    assert_eq!(from_bag, from_both);

    let plain = generate(&engine, &[Value::from("qart"), Value::bag([("scale", Value::from(6))])])
        .unwrap();
    assert_ne!(plain, from_bag);
}

#[test]
fn positional_image_overrides_bag_image() {
    let engine = HalftoneEngine::new();
    let options = Value::bag([
        ("scale", Value::from(4)),
        ("halftoneBase64", Value::from(STANDARD.encode(reference_png()))),
    ]);

    // The bag image is valid but the positional one is not, so the engine sees
    // the positional bytes and rejects them.
    let err = generate(
        &engine,
        &[Value::from("qart"), options, Value::Bytes(b"garbage".to_vec())],
    )
    .unwrap_err();
    assert!(matches!(err, BridgeError::EngineEncodeFailed(_)));
    assert!(err.to_string().contains("invalid reference image"));
}

#[test]
fn rotation_keeps_square_size() {
    let engine = HalftoneEngine::new();
    let call = |rotation: i32| {
        let args = [
            Value::from("https://example.com"),
            Value::bag([("scale", Value::from(2)), ("rotation", Value::from(rotation))]),
        ];
        decode_envelope_image(&generate(&engine, &args).unwrap().base64_encoded_image)
    };

    let upright = call(0);
    let turned = call(1);
    assert_eq!(upright.dimensions(), turned.dimensions());
    assert_ne!(upright, turned);
    assert_eq!(call(4), upright);
}

#[test]
fn engine_errors_are_single_strings() {
    let engine = HalftoneEngine::new();
    let args = [
        Value::from("https://example.com"),
        Value::bag([("version", Value::from(99))]),
    ];
    let err = generate(&engine, &args).unwrap_err();
    assert_eq!(
        err.to_string(),
        "error: invalid version 99: expected 0 (auto) or 1-40"
    );
}

#[test]
fn missing_arguments() {
    let engine = HalftoneEngine::new();
    assert_eq!(
        generate(&engine, &[Value::from("https://example.com")]),
        Err(BridgeError::MissingArguments)
    );
}
