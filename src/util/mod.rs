mod logger;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// A leveled debug switch for the compile pipeline's phases (lex, shape,
/// tree-build, fold, linearize). `None` disables tracing; each step prints
/// one line once the configured level is reached.
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}
