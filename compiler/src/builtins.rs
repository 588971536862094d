//! Builtin call identification.
//!
//! `resolve_builtin` proves that an expression still names an untouched
//! standard library function; `builtin_function_id` maps that name to the
//! fast-call id the runtime dispatches on. A miss is always safe: the call
//! site simply keeps the generic call.

use crate::globals::{GlobalState, GlobalTracker};
use crate::options::CompileOptions;
use crate::variables::VariableTracker;
use tidal_syntax::ast::Expr;
use tracing::trace;
use vm::{BuiltinFunction, NO_FAST_CALL};

/// `(object, method)` identity of a builtin. The default value is the empty
/// descriptor, meaning "not a builtin".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Builtin {
    pub object: Option<String>,
    pub method: String,
}

impl Builtin {
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            object: None,
            method: name.into(),
        }
    }

    pub fn namespaced(object: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            object: Some(object.into()),
            method: method.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.method.is_empty()
    }

    /// Bare global `name`.
    pub fn is_global(&self, name: &str) -> bool {
        self.object.is_none() && self.method == name
    }

    pub fn is_method(&self, object: &str, method: &str) -> bool {
        self.object.as_deref() == Some(object) && self.method == method
    }
}

/// Resolves `expr` to the builtin it provably denotes, or the empty
/// descriptor.
pub fn resolve_builtin(expr: &Expr, globals: &GlobalTracker, variables: &VariableTracker) -> Builtin {
    match expr {
        Expr::Local { local, .. } => match stable_init(*local, variables) {
            Some(init) => resolve_builtin(init, globals, variables),
            None => Builtin::default(),
        },
        Expr::Global { name, .. } => {
            if globals.state_of(name) == Some(GlobalState::Default) {
                Builtin::global(name.as_str())
            } else {
                trace!(global = %name, "global is not a builtin candidate");
                Builtin::default()
            }
        }
        Expr::IndexName { object, member, .. } => {
            let base = resolve_builtin(object, globals, variables);
            match base.object {
                None if !base.is_empty() => Builtin::namespaced(base.method, member.as_str()),
                _ => Builtin::default(),
            }
        }
        Expr::Group { inner, .. } => resolve_builtin(inner, globals, variables),
        _ => Builtin::default(),
    }
}

fn stable_init<'a>(
    local: tidal_syntax::ast::LocalId,
    variables: &VariableTracker<'a>,
) -> Option<&'a Expr> {
    let info = variables.info_of(local)?;
    if info.is_stable() {
        info.init
    } else {
        trace!(local = local.0, "local is reassigned");
        None
    }
}

/// Fast-call id for `builtin` under `options`.
pub fn builtin_function_id(builtin: &Builtin, options: &CompileOptions) -> Option<BuiltinFunction> {
    if builtin.is_empty() {
        return None;
    }

    // configured constructor first: it takes precedence over the static tables
    if let Some(ctor) = options.vector_ctor.as_deref() {
        let is_ctor = match options.vector_lib.as_deref() {
            Some(lib) => builtin.is_method(lib, ctor),
            None => builtin.is_global(ctor),
        };
        if is_ctor {
            return Some(BuiltinFunction::Vector);
        }
    }

    match builtin.object.as_deref() {
        None => global_function(&builtin.method),
        Some(object) => library_function(object, &builtin.method),
    }
}

/// Raw `FASTCALL` operand for `builtin`, `NO_FAST_CALL` when none applies.
pub fn fast_call_id(builtin: &Builtin, options: &CompileOptions) -> i32 {
    match builtin_function_id(builtin, options) {
        Some(b) => b.as_u8() as i32,
        None => NO_FAST_CALL,
    }
}

fn global_function(name: &str) -> Option<BuiltinFunction> {
    use BuiltinFunction::*;
    let b = match name {
        "assert" => Assert,
        "type" => Type,
        "typeof" => Typeof,
        "rawset" => Rawset,
        "rawget" => Rawget,
        "rawequal" => Rawequal,
        "unpack" => TableUnpack,
        "select" => SelectVararg,
        "wait" => Wait,
        _ => return None,
    };
    Some(b)
}

/// Libraries whose members have fast paths.
const FAST_LIBRARIES: &[&str] = &["math", "bit32", "string", "table", "cpr", "json", "base64"];

fn library_function(object: &str, method: &str) -> Option<BuiltinFunction> {
    if !FAST_LIBRARIES.contains(&object) {
        return None;
    }
    BuiltinFunction::ALL.iter().copied().find(|b| {
        b.name()
            .split_once('.')
            .is_some_and(|(lib, member)| lib == object && member == method)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn opts() -> CompileOptions {
        CompileOptions::default()
    }

    #[test]
    fn test_empty_maps_to_nothing() {
        assert_eq!(builtin_function_id(&Builtin::default(), &opts()), None);
        assert_eq!(fast_call_id(&Builtin::default(), &opts()), NO_FAST_CALL);
    }

    #[test]
    fn test_bare_globals() {
        let o = opts();
        assert_eq!(
            builtin_function_id(&Builtin::global("assert"), &o),
            Some(BuiltinFunction::Assert)
        );
        assert_eq!(
            builtin_function_id(&Builtin::global("unpack"), &o),
            Some(BuiltinFunction::TableUnpack)
        );
        assert_eq!(
            builtin_function_id(&Builtin::global("select"), &o),
            Some(BuiltinFunction::SelectVararg)
        );
        assert_eq!(
            builtin_function_id(&Builtin::global("wait"), &o),
            Some(BuiltinFunction::Wait)
        );
        assert_eq!(builtin_function_id(&Builtin::global("print"), &o), None);
        // only reachable through the configured constructor
        assert_eq!(builtin_function_id(&Builtin::global("vector"), &o), None);
    }

    #[test]
    fn test_library_members() {
        let o = opts();
        let cases = [
            ("math", "sqrt", BuiltinFunction::MathSqrt),
            ("math", "approximately", BuiltinFunction::MathApproximately),
            ("bit32", "countrz", BuiltinFunction::Bit32Countrz),
            ("string", "trimstart", BuiltinFunction::StringTrimStart),
            ("table", "insert", BuiltinFunction::TableInsert),
            ("cpr", "head", BuiltinFunction::CprHead),
            ("json", "decode", BuiltinFunction::JsonDecode),
            ("base64", "encode", BuiltinFunction::Base64Encode),
        ];
        for (lib, member, expected) in cases {
            assert_eq!(
                builtin_function_id(&Builtin::namespaced(lib, member), &o),
                Some(expected),
                "{lib}.{member}"
            );
        }
        assert_eq!(builtin_function_id(&Builtin::namespaced("math", "nope"), &o), None);
        assert_eq!(builtin_function_id(&Builtin::namespaced("os", "time"), &o), None);
        assert_eq!(builtin_function_id(&Builtin::namespaced("string", "format"), &o), None);
    }

    #[test]
    fn test_every_library_id_is_reachable() {
        let o = opts();
        for &b in BuiltinFunction::ALL {
            let Some((lib, member)) = b.name().split_once('.') else {
                continue;
            };
            assert_eq!(
                builtin_function_id(&Builtin::namespaced(lib, member), &o),
                Some(b)
            );
        }
    }

    #[test]
    fn test_vector_constructor() {
        let bare = CompileOptions {
            vector_ctor: Some("vector".into()),
            ..opts()
        };
        assert_eq!(
            builtin_function_id(&Builtin::global("vector"), &bare),
            Some(BuiltinFunction::Vector)
        );

        let scoped = CompileOptions {
            vector_ctor: Some("new".into()),
            vector_lib: Some("Vector3".into()),
            ..opts()
        };
        assert_eq!(
            builtin_function_id(&Builtin::namespaced("Vector3", "new"), &scoped),
            Some(BuiltinFunction::Vector)
        );
        assert_eq!(builtin_function_id(&Builtin::global("new"), &scoped), None);

        // a configured constructor wins over a same-named builtin, so a host
        // that names its constructor `type` gets vector calls, not typeof
        let shadowing = CompileOptions {
            vector_ctor: Some("type".into()),
            ..opts()
        };
        assert_eq!(
            builtin_function_id(&Builtin::global("type"), &shadowing),
            Some(BuiltinFunction::Vector)
        );
    }

    fn arb_builtin() -> impl Strategy<Value = Builtin> {
        let names = prop::sample::select(vec![
            "", "math", "sqrt", "table", "insert", "assert", "vector", "new", "bit32", "band",
        ]);
        (prop::option::of(names.clone()), names).prop_map(|(object, method)| Builtin {
            object: object.map(String::from),
            method: method.to_string(),
        })
    }

    proptest! {
        #[test]
        fn prop_mapping_is_pure(builtin in arb_builtin(), ctor in prop::option::of("[a-z]{1,6}")) {
            let options = CompileOptions { vector_ctor: ctor, ..opts() };
            let first = builtin_function_id(&builtin, &options);
            prop_assert_eq!(first, builtin_function_id(&builtin.clone(), &options.clone()));
            if builtin.is_empty() {
                prop_assert_eq!(first, None);
            }
        }
    }
}
