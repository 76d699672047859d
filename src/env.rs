use std::{cell::RefCell, ffi::OsStr, path::PathBuf};

#[derive(Clone)]
struct Env {
    trace_enabled: bool,
    catalog_path: Option<PathBuf>,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

pub fn init() {
    let value = Env {
        trace_enabled: var_is("M6800_TRACE", "1"),
        catalog_path: std::env::var_os("M6800_CATALOG")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from),
    };
    set_env(value);
}

/// Print every executed instruction.
pub fn is_trace_enabled() -> bool {
    with_env(|env| env.trace_enabled)
}

/// Instruction descriptor to use instead of the built-in one.
pub fn catalog_path() -> Option<PathBuf> {
    with_env(|env| env.catalog_path.clone())
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.as_ref().unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(env)
    })
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}
