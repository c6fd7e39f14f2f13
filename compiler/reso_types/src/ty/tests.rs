#![allow(clippy::expect_used, reason = "test code uses expect for concise assertions")]

use pretty_assertions::assert_eq;
use reso_ir::StringInterner;

use super::*;

#[test]
fn display_uses_source_names() {
    let interner = StringInterner::new();
    let point = Type::Aggregate(interner.intern("Point"));
    let cases = [
        (Type::I32, "i32"),
        (Type::U8, "u8"),
        (Type::ISIZE, "isize"),
        (Type::USIZE, "usize"),
        (Type::F32, "f32"),
        (Type::Unit, "()"),
        (Type::String, "String"),
        (Type::vector(Type::vector(Type::I64)), "Vector<Vector<i64>>"),
        (Type::vector(point.clone()), "Vector<Point>"),
        (point, "Point"),
    ];
    for (ty, expected) in cases {
        assert_eq!(ty.display(&interner).to_string(), expected);
    }
}

#[test]
fn primitive_lookup_round_trips_display() {
    let interner = StringInterner::new();
    for name in [
        "i8", "i16", "i32", "i64", "isize", "u8", "u16", "u32", "u64", "usize", "f32", "f64",
        "bool", "char", "String",
    ] {
        let ty = Type::primitive(name).expect("built-in type");
        assert_eq!(ty.display(&interner).to_string(), name);
    }
    assert_eq!(Type::primitive("Point"), None);
}

#[test]
fn classification() {
    assert!(Type::I8.is_signed_int());
    assert!(Type::USIZE.is_unsigned_int());
    assert!(!Type::Char.is_integer());
    assert!(Type::F64.is_numeric());
    assert!(Type::vector(Type::Bool).is_nullable());
    assert!(!Type::String.is_nullable());
    assert!(Type::String.is_reference());
    assert_eq!(Type::vector(Type::U16).element(), Some(&Type::U16));
    assert_eq!(Type::I64.int_width(), Some(IntWidth::W64));
}
