use pegkit_span::{Pos, Span, TextPos};

#[test]
fn text_pos_roundtrip() {
    let p = TextPos::new(12, 34);
    let json = serde_json::to_string(&p).unwrap();
    let back: TextPos = serde_json::from_str(&json).unwrap();
    assert_eq!(p, back);
}

#[test]
fn pos_roundtrip() {
    let mut p = Pos::start();
    p.advance(9);
    p.advance_line();
    let json = serde_json::to_string(&p).unwrap();
    let back: Pos = serde_json::from_str(&json).unwrap();
    assert_eq!(p.index, back.index);
    assert_eq!(p.text, back.text);
}

#[test]
fn span_roundtrip() {
    let span = Span::new(Pos::at(3), Pos::at(8));
    let json = serde_json::to_string(&span).unwrap();
    let back: Span = serde_json::from_str(&json).unwrap();
    assert_eq!(span, back);
}

#[test]
fn span_json_shape_is_stable() {
    let span = Span::new(Pos::at(0), Pos::at(1));
    let value: serde_json::Value = serde_json::to_value(span).unwrap();
    assert!(value.get("begin").is_some());
    assert!(value.get("end").is_some());
}
