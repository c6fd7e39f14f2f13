use pretty_assertions::assert_eq;
use reso_ir::StringInterner;

use super::*;

const LAYOUT: TargetLayout = TargetLayout::new(64);

fn cast(from: &Type, to: &Type) -> Result<CastKind, CastError> {
    classify_cast(from, to, LAYOUT)
}

#[test]
fn integer_widen_follows_source_signedness() {
    assert_eq!(
        cast(&Type::I8, &Type::U64),
        Ok(CastKind::IntExtend { signed: true })
    );
    assert_eq!(
        cast(&Type::U8, &Type::I64),
        Ok(CastKind::IntExtend { signed: false })
    );
    assert_eq!(cast(&Type::I64, &Type::I16), Ok(CastKind::IntTruncate));
}

#[test]
fn same_size_integers_are_identity() {
    assert_eq!(cast(&Type::I32, &Type::U32), Ok(CastKind::Identity));
    assert_eq!(cast(&Type::USIZE, &Type::I64), Ok(CastKind::Identity));
    assert_eq!(cast(&Type::Char, &Type::U32), Ok(CastKind::Identity));
    assert_eq!(cast(&Type::I32, &Type::Char), Ok(CastKind::Identity));
}

#[test]
fn char_widens_as_unsigned() {
    assert_eq!(
        cast(&Type::Char, &Type::I64),
        Ok(CastKind::IntExtend { signed: false })
    );
    assert_eq!(cast(&Type::Char, &Type::U8), Ok(CastKind::IntTruncate));
    assert_eq!(
        cast(&Type::Char, &Type::F64),
        Err(CastError::NotConvertible)
    );
}

#[test]
fn float_conversions() {
    assert_eq!(cast(&Type::F32, &Type::F64), Ok(CastKind::FloatExtend));
    assert_eq!(cast(&Type::F64, &Type::F32), Ok(CastKind::FloatTruncate));
    assert_eq!(
        cast(&Type::U16, &Type::F32),
        Ok(CastKind::IntToFloat { signed: false })
    );
    assert_eq!(
        cast(&Type::F64, &Type::I8),
        Ok(CastKind::FloatToInt { signed: true })
    );
}

#[test]
fn non_numeric_types_are_rejected() {
    let interner = StringInterner::new();
    let point = Type::Aggregate(interner.intern("Point"));
    for (from, to) in [
        (Type::Bool, Type::I32),
        (Type::I32, Type::Bool),
        (Type::String, Type::U64),
        (point.clone(), Type::I64),
        (Type::F64, Type::vector(Type::F64)),
        (Type::Unit, Type::I32),
    ] {
        assert_eq!(cast(&from, &to), Err(CastError::NotConvertible), "{from:?} as {to:?}");
    }
    assert_eq!(cast(&point, &point), Ok(CastKind::Identity));
    assert_eq!(cast(&Type::Bool, &Type::Bool), Ok(CastKind::Identity));
}

#[test]
fn null_assigns_only_to_nullable() {
    let interner = StringInterner::new();
    let point = Type::Aggregate(interner.intern("Point"));
    assert!(assignable(&Type::Null, &point));
    assert!(assignable(&Type::Null, &Type::vector(Type::I32)));
    assert!(!assignable(&Type::Null, &Type::String));
    assert!(!assignable(&Type::Null, &Type::I32));
    assert!(!assignable(&Type::I32, &Type::I64));
    assert!(assignable(&Type::U8, &Type::U8));
}
