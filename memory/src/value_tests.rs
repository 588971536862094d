#[cfg(test)]
mod tests {
    use crate::value::{TAG_ENV, TAG_NUMBER, TAG_STRING};
    use crate::Value;

    #[test]
    fn test_boxed_number_basics() {
        let v = Value::number(123.5);
        assert!(v.is_number());
        assert!(!v.is_obj());
        assert_eq!(v.as_number(), Some(123.5));
        assert_eq!(v.type_tag(), TAG_NUMBER);
    }

    #[test]
    fn test_special_doubles_stay_numbers() {
        for n in [f64::INFINITY, f64::NEG_INFINITY, -0.0, f64::MIN, f64::MAX] {
            let v = Value::number(n);
            assert!(v.is_number(), "{n} should stay unboxed");
            assert_eq!(v.as_number().map(f64::to_bits), Some(n.to_bits()));
        }
    }

    #[test]
    fn test_nan_is_canonicalized() {
        let v = Value::number(f64::NAN);
        assert!(v.is_number());
        assert!(v.as_number().unwrap().is_nan());
        // negative quiet NaN would collide with the box range
        let weird = f64::from_bits(0xFFFF_0000_0000_0001);
        assert!(Value::number(weird).is_number());
    }

    #[test]
    fn test_tagged_bools() {
        let t = Value::bool(true);
        let f = Value::bool(false);
        assert!(t.is_bool());
        assert!(f.is_bool());
        assert_eq!(t.as_bool(), Some(true));
        assert_eq!(f.as_bool(), Some(false));
        assert!(!t.is_number());
        assert!(f.is_falsey());
        assert!(!t.is_falsey());
    }

    #[test]
    fn test_tagged_nil() {
        let n = Value::nil();
        assert!(n.is_nil());
        assert!(n.is_falsey());
        assert_eq!(Value::default(), n);
        assert_eq!(n.as_handle(), None);
    }

    #[test]
    fn test_handles_round_trip() {
        let s = Value::string(7);
        assert!(s.is_string());
        assert_eq!(s.type_tag(), TAG_STRING);
        assert_eq!(s.as_handle(), Some(7));

        let e = Value::env(u32::MAX);
        assert!(e.is_env());
        assert_eq!(e.type_tag(), TAG_ENV);
        assert_eq!(e.as_handle(), Some(u32::MAX));
        assert_ne!(Value::table(1), Value::function(1));
    }

    #[test]
    fn test_raw_equal_numbers() {
        assert!(Value::number(0.0).raw_equal(&Value::number(-0.0)));
        assert!(!Value::number(f64::NAN).raw_equal(&Value::number(f64::NAN)));
        assert!(!Value::number(1.0).raw_equal(&Value::string(1)));
        assert!(Value::string(3).raw_equal(&Value::string(3)));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::number(1.0).type_name(), "number");
        assert_eq!(Value::nil().type_name(), "nil");
        assert_eq!(Value::bool(true).type_name(), "boolean");
        assert_eq!(Value::string(0).type_name(), "string");
        assert_eq!(Value::table(0).type_name(), "table");
        assert_eq!(Value::function(0).type_name(), "function");
        assert_eq!(Value::handle(0).type_name(), "userdata");
        assert_eq!(Value::coroutine(0).type_name(), "thread");
    }

    mod prop {
        use crate::Value;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_non_nan_double_round_trips(n in any::<f64>().prop_filter("nan", |n| !n.is_nan())) {
                let v = Value::number(n);
                prop_assert!(v.is_number());
                prop_assert_eq!(v.as_number().map(f64::to_bits), Some(n.to_bits()));
            }

            #[test]
            fn table_handles_round_trip(h in any::<u32>()) {
                let v = Value::table(h);
                prop_assert!(v.is_table());
                prop_assert_eq!(v.as_handle(), Some(h));
            }
        }
    }
}
