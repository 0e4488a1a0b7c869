//! Tree-walking evaluator and host API

use std::fs;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use lru::LruCache;
use regex::Regex;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::lexer::Scanner;
use crate::parser::{Expression, Literal, Parser, Program};
use crate::runtime::collector::FrameTracker;
use crate::runtime::{Closure, Environment, Function, InterpreterConfig, Operand};
use crate::tools::{CallContext, ToolRegistry};

/// Remaining native stack below which evaluation switches to a fresh segment
pub(crate) const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each additional stack segment
pub(crate) const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Destination of `print`/`println`
pub enum OutputSink {
    /// Collected in memory; read with [`Interpreter::take_output`]
    Buffer(String),
    /// Written straight through
    Writer(Box<dyn Write>),
}

/// VeLa interpreter
///
/// Owns the frame stack (intrinsics, global, then host frames), the parsed
/// program cache and the output sink. Instances are single-threaded.
pub struct Interpreter {
    config: InterpreterConfig,
    registry: Rc<ToolRegistry>,
    /// Root frame holding the built-ins
    intrinsics: Environment,
    /// Global frame followed by host-pushed frames; never empty
    frames: Vec<Environment>,
    call_depth: usize,
    /// Every call and host frame, for cycle collection
    tracker: FrameTracker,
    output: OutputSink,
    program_cache: LruCache<String, Rc<Program>>,
    regex_cache: LruCache<String, Regex>,
}

impl Interpreter {
    /// Creates an interpreter with the standard library and default settings
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    /// Creates an interpreter with the standard library, then loads any user
    /// code found in `config.source_dirs`
    pub fn with_config(config: InterpreterConfig) -> Self {
        let mut interpreter = Self::with_registry(config, ToolRegistry::new());
        if !interpreter.config.source_dirs.is_empty() {
            interpreter.load_user_code();
        }
        interpreter
    }

    /// Creates an interpreter over a custom built-in registry
    pub fn with_registry(config: InterpreterConfig, registry: ToolRegistry) -> Self {
        let intrinsics = Environment::new();
        for (name, tool) in registry.iter() {
            intrinsics.define(name.clone(), Operand::builtin(tool.clone()));
        }

        let global = intrinsics.child();
        global.define_constant("PI", Operand::Real(std::f64::consts::PI));
        global.define_constant("π", Operand::Real(std::f64::consts::PI));
        global.define_constant("E", Operand::Real(std::f64::consts::E));

        let program_cache = LruCache::new(cache_capacity(config.program_cache_size));
        let regex_cache = LruCache::new(cache_capacity(config.regex_cache_size));

        Interpreter {
            config,
            registry: Rc::new(registry),
            intrinsics,
            frames: vec![global],
            call_depth: 0,
            tracker: FrameTracker::new(),
            output: OutputSink::Buffer(String::new()),
            program_cache,
            regex_cache,
        }
    }

    /// Interpreter settings
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Registry the built-ins came from
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    // ========================================================================
    // Host API
    // ========================================================================

    /// Parses (through the cache) and evaluates a program in the current frame
    pub fn program(&mut self, source: &str) -> Result<Option<Operand>> {
        let program = self.parse(source)?;
        let env = self.current_env();
        let result = self.execute_in(&program, &env);
        drop(env);
        if self.call_depth == 0 {
            self.tracker.maybe_collect();
        }
        if self.config.verbose {
            if let Err(err) = &result {
                debug!(error = %err, "program failed");
            }
        }
        result
    }

    /// Reads and evaluates a program file, resolving relative paths against the
    /// configured source directories
    pub fn program_file(&mut self, path: impl AsRef<Path>) -> Result<Option<Operand>> {
        let resolved = self.resolve_path(path.as_ref())?;
        let source = fs::read_to_string(&resolved).map_err(|e| Error::Io {
            path: resolved.display().to_string(),
            message: e.to_string(),
        })?;
        debug!(path = %resolved.display(), "evaluating program file");
        self.program(&source)
    }

    /// Evaluates every `.vl`/`.vela` file in each source directory, in name
    /// order; files that fail are logged and skipped. Returns the number loaded.
    pub fn load_user_code(&mut self) -> usize {
        let mut loaded = 0;
        for dir in self.config.source_dirs.clone() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "cannot read VeLa source directory");
                    continue;
                }
            };
            let mut files: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    matches!(
                        p.extension().and_then(|ext| ext.to_str()),
                        Some("vl") | Some("vela")
                    )
                })
                .collect();
            files.sort();

            for file in files {
                match self.program_file(&file) {
                    Ok(_) => loaded += 1,
                    Err(e) => warn!(file = %file.display(), error = %e, "error when sourcing VeLa code"),
                }
            }
        }
        loaded
    }

    /// Evaluates a program that must yield a number
    pub fn real_expression(&mut self, source: &str) -> Result<f64> {
        match self.program(source)? {
            Some(value @ (Operand::Real(_) | Operand::Integer(_))) => value.as_real(),
            Some(other) => Err(Error::type_mismatch(format!(
                "expected a real-valued expression but found {}",
                other.type_name()
            ))),
            None => Err(Error::NoValue {
                context: "real expression".to_string(),
            }),
        }
    }

    /// Evaluates a program that must yield a boolean
    pub fn boolean_expression(&mut self, source: &str) -> Result<bool> {
        match self.program(source)? {
            Some(value) => value.as_boolean(),
            None => Err(Error::NoValue {
                context: "boolean expression".to_string(),
            }),
        }
    }

    /// Pushes a host frame pre-populated with `bindings`; names listed in
    /// `constants` become constant bindings
    pub fn push_environment<I, S>(&mut self, bindings: I, constants: &[&str]) -> Environment
    where
        I: IntoIterator<Item = (S, Operand)>,
        S: AsRef<str>,
    {
        let constants: Vec<String> = constants.iter().map(|c| canonical_name(c)).collect();
        let frame = self.current_env().child();
        for (name, value) in bindings {
            let name = canonical_name(name.as_ref());
            if constants.contains(&name) {
                frame.define_constant(name, value);
            } else {
                frame.define(name, value);
            }
        }
        debug!(depth = self.frames.len() + 1, "pushed host environment");
        self.tracker.track(&frame);
        self.frames.push(frame.clone());
        frame
    }

    /// Pops the top host frame; the global frame is never popped
    pub fn pop_environment(&mut self) -> Option<Environment> {
        if self.frames.len() <= 1 {
            return None;
        }
        debug!(depth = self.frames.len(), "popped host environment");
        self.frames.pop()
    }

    /// Releases call and host frames kept alive only by reference cycles, such
    /// as a function defined inside a call that is stored in the call's own
    /// frame. Runs automatically after programs once enough frames accumulate.
    /// Returns the number of frames released.
    pub fn collect_garbage(&mut self) -> usize {
        self.tracker.collect()
    }

    /// Frame programs are currently evaluated in
    pub fn current_env(&self) -> Environment {
        match self.frames.last() {
            Some(env) => env.clone(),
            None => self.intrinsics.clone(),
        }
    }

    /// Binds a mutable value in the current frame
    pub fn bind(&mut self, name: &str, value: Operand) {
        self.current_env().define(canonical_name(name), value);
    }

    /// Binds a constant in the current frame, failing if the name is visible
    pub fn bind_constant(&mut self, name: &str, value: Operand) -> Result<()> {
        self.current_env()
            .bind_constant(&canonical_name(name), value)
    }

    /// Looks a name up from the current frame
    pub fn lookup(&self, name: &str) -> Option<Operand> {
        self.current_env().lookup(&canonical_name(name))
    }

    /// Replaces the output sink with a writer
    pub fn set_output(&mut self, writer: Box<dyn Write>) {
        self.output = OutputSink::Writer(writer);
    }

    /// Takes everything printed so far when output is buffered
    pub fn take_output(&mut self) -> String {
        match &mut self.output {
            OutputSink::Buffer(buffer) => std::mem::take(buffer),
            OutputSink::Writer(_) => String::new(),
        }
    }

    pub(crate) fn write_output(&mut self, text: &str) -> Result<()> {
        match &mut self.output {
            OutputSink::Buffer(buffer) => {
                buffer.push_str(text);
                Ok(())
            }
            OutputSink::Writer(writer) => writer
                .write_all(text.as_bytes())
                .and_then(|_| writer.flush())
                .map_err(|e| Error::Io {
                    path: "<output>".to_string(),
                    message: e.to_string(),
                }),
        }
    }

    fn resolve_path(&self, path: &Path) -> Result<PathBuf> {
        if path.is_absolute() || path.exists() {
            return Ok(path.to_path_buf());
        }
        self.config
            .source_dirs
            .iter()
            .map(|dir| dir.join(path))
            .find(|candidate| candidate.exists())
            .ok_or_else(|| Error::Io {
                path: path.display().to_string(),
                message: "not found in any source directory".to_string(),
            })
    }

    // ========================================================================
    // Parsing and caches
    // ========================================================================

    /// Parses source text, sharing the AST of previously seen programs
    pub fn parse(&mut self, source: &str) -> Result<Rc<Program>> {
        if let Some(program) = self.program_cache.get(source) {
            trace!("program cache hit");
            return Ok(program.clone());
        }

        let tokens = Scanner::new(source).scan_tokens()?;
        let program = Rc::new(Parser::new(tokens).parse()?);
        debug!(
            expressions = program.expressions.len(),
            "parsed program"
        );
        self.program_cache.put(source.to_string(), program.clone());
        Ok(program)
    }

    /// Compiled regular expression, cached by pattern text
    pub fn regex(&mut self, pattern: &str) -> Result<Regex> {
        if let Some(regex) = self.regex_cache.get(pattern) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(pattern).map_err(|e| Error::RegexError {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        self.regex_cache.put(pattern.to_string(), regex.clone());
        Ok(regex)
    }

    /// True if the whole of `text` matches `pattern`
    pub fn full_match(&mut self, text: &str, pattern: &str) -> Result<bool> {
        let anchored = format!("^(?:{})$", pattern);
        let regex = self.regex(&anchored).map_err(|_| {
            // Report against the user's pattern, not the anchored form
            match Regex::new(pattern) {
                Err(e) => Error::RegexError {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                },
                Ok(_) => Error::RegexError {
                    pattern: pattern.to_string(),
                    message: "cannot be anchored".to_string(),
                },
            }
        })?;
        Ok(regex.is_match(text))
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Evaluates a parsed program in the current frame
    pub fn execute(&mut self, program: &Program) -> Result<Option<Operand>> {
        let env = self.current_env();
        self.execute_in(program, &env)
    }

    /// Evaluates a parsed program in `env`; the result is that of the last
    /// top-level expression
    pub fn execute_in(&mut self, program: &Program, env: &Environment) -> Result<Option<Operand>> {
        let mut result = None;
        for expr in &program.expressions {
            result = self.evaluate(expr, env)?;
        }
        Ok(result)
    }

    /// Evaluates one expression; `None` means it produced no value
    pub fn evaluate(&mut self, expr: &Expression, env: &Environment) -> Result<Option<Operand>> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.evaluate_inner(expr, env)
        })
    }

    /// Evaluates an expression that must produce a value
    pub fn evaluate_value(&mut self, expr: &Expression, env: &Environment) -> Result<Operand> {
        self.evaluate(expr, env)?.ok_or_else(|| Error::NoValue {
            context: describe(expr),
        })
    }

    fn evaluate_inner(&mut self, expr: &Expression, env: &Environment) -> Result<Option<Operand>> {
        match expr {
            Expression::Literal(literal) => Ok(Some(literal_operand(literal))),

            Expression::Variable(name) => env.get(name).map(Some),

            Expression::Unary { op, operand } => {
                let value = self.evaluate_value(operand, env)?;
                self.apply_unary(*op, &value).map(Some)
            }

            Expression::Binary { op, left, right } => {
                let left = self.evaluate_value(left, env)?;
                let right = self.evaluate_value(right, env)?;
                self.apply_binary(*op, &left, &right).map(Some)
            }

            Expression::Binding {
                name,
                value,
                constant,
            } => {
                let value = self.evaluate_value(value, env)?;
                if *constant {
                    env.bind_constant(name, value)?;
                } else {
                    env.assign(name, value)?;
                }
                Ok(None)
            }

            Expression::Block(body) => {
                let mut result = None;
                for expr in body {
                    result = self.evaluate(expr, env)?;
                }
                Ok(result)
            }

            Expression::Selection(arms) => {
                for arm in arms {
                    let guard = self.evaluate_value(&arm.guard, env)?;
                    if condition_value(&guard, "when")? {
                        return self.evaluate(&arm.consequent, env);
                    }
                }
                Ok(None)
            }

            Expression::While { condition, body } => {
                loop {
                    let test = self.evaluate_value(condition, env)?;
                    if !condition_value(&test, "while")? {
                        break;
                    }
                    self.evaluate(body, env)?;
                }
                Ok(None)
            }

            Expression::If {
                condition,
                consequent,
                alternative,
            } => {
                let test = self.evaluate_value(condition, env)?;
                if condition_value(&test, "if")? {
                    self.evaluate(consequent, env)
                } else if let Some(alternative) = alternative {
                    self.evaluate(alternative, env)
                } else {
                    Ok(None)
                }
            }

            Expression::List(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.evaluate_value(element, env)?);
                }
                Ok(Some(Operand::list(items)))
            }

            Expression::FunctionDef(def) => {
                let closure = Operand::closure(Closure::new(def.clone(), env.clone()));
                match &def.name {
                    Some(name) => {
                        if env.is_local_constant(name) {
                            return Err(Error::binding(
                                name.clone(),
                                format!("'{}' is a constant binding in this environment.", name),
                            ));
                        }
                        env.define(name.clone(), closure);
                        Ok(None)
                    }
                    None => Ok(Some(closure)),
                }
            }

            Expression::Call { callee, args } => {
                let function = match self.evaluate_value(callee, env)? {
                    Operand::Function(function) => function,
                    other => {
                        return Err(Error::NotCallable {
                            type_name: other.type_name(),
                        })
                    }
                };

                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.evaluate_value(arg, env)?);
                }

                self.call_function(&function, values, env)
            }
        }
    }

    /// Applies a function value to evaluated arguments; `env` is the caller's frame
    pub fn call_function(
        &mut self,
        function: &Function,
        args: Vec<Operand>,
        env: &Environment,
    ) -> Result<Option<Operand>> {
        match function {
            Function::Builtin(tool) => {
                if let Some(arity) = tool.arity() {
                    if args.len() != arity {
                        return Err(Error::arity(tool.name(), arity, args.len()));
                    }
                }
                let tool = tool.clone();
                let mut ctx = CallContext::new(self, env);
                tool.execute(&mut ctx, &args)
            }
            Function::Closure(closure) => self.call_closure(closure, args),
        }
    }

    fn call_closure(&mut self, closure: &Rc<Closure>, args: Vec<Operand>) -> Result<Option<Operand>> {
        let params = closure.params();
        if params.len() != args.len() {
            return Err(Error::arity(closure.name(), params.len(), args.len()));
        }

        // Parameters live in a fresh frame whose parent is the defining frame
        let frame = closure.env.child();
        self.tracker.track(&frame);
        for (param, arg) in params.iter().zip(args) {
            let value = arg.convert_to(param.type_name).ok_or_else(|| {
                Error::type_mismatch(format!(
                    "{}: parameter {} expects a value of type {} but found {}",
                    closure.name(),
                    param.name,
                    param.type_name,
                    arg.type_name()
                ))
            })?;
            frame.define(param.name.clone(), value);
        }

        if self.call_depth >= self.config.max_call_depth {
            return Err(Error::StackOverflow {
                depth: self.config.max_call_depth,
            });
        }
        self.call_depth += 1;
        trace!(function = closure.name(), depth = self.call_depth, "call");
        let result = self.evaluate(closure.body(), &frame);
        self.call_depth -= 1;

        match (closure.return_type(), result?) {
            (Some(return_type), Some(value)) => {
                value.convert_to(return_type).map(Some).ok_or_else(|| {
                    Error::type_mismatch(format!(
                        "{} must return a value of type {} but returned {}",
                        closure.name(),
                        return_type,
                        value.type_name()
                    ))
                })
            }
            (Some(return_type), None) => Err(Error::NoValue {
                context: format!(
                    "{} (declared to return {})",
                    closure.name(),
                    return_type
                ),
            }),
            (None, value) => Ok(value),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        // Named functions capture the frame that holds them; clearing breaks the
        // cycle for the interpreter's own frames, the collector for the rest
        for frame in &self.frames {
            frame.clear();
        }
        self.intrinsics.clear();
        self.tracker.collect();
    }
}

/// Canonical form of a host-supplied name
pub fn canonical_name(name: &str) -> String {
    name.to_ascii_uppercase()
}

fn cache_capacity(size: usize) -> NonZeroUsize {
    NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN)
}

fn literal_operand(literal: &Literal) -> Operand {
    match literal {
        Literal::Integer(n) => Operand::Integer(*n),
        Literal::Real(x) => Operand::Real(*x),
        Literal::String(s) => Operand::String(s.clone()),
        Literal::Boolean(b) => Operand::Boolean(*b),
    }
}

fn condition_value(value: &Operand, construct: &str) -> Result<bool> {
    match value {
        Operand::Boolean(b) => Ok(*b),
        other => Err(Error::type_mismatch(format!(
            "{} condition must be boolean but found {}",
            construct,
            other.type_name()
        ))),
    }
}

/// Short description of an expression for "no value" diagnostics
fn describe(expr: &Expression) -> String {
    match expr {
        Expression::Call { callee, .. } => match callee.as_ref() {
            Expression::Variable(name) => format!("call to {}", name),
            _ => "function call".to_string(),
        },
        Expression::Selection(_) => "when expression (no guard matched)".to_string(),
        Expression::If { .. } => "if expression (no else branch)".to_string(),
        Expression::Binding { name, .. } => format!("binding of {}", name),
        Expression::While { .. } => "while loop".to_string(),
        Expression::Block(_) => "block".to_string(),
        Expression::FunctionDef(_) => "function definition".to_string(),
        _ => "expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Option<Operand> {
        Interpreter::new().program(source).unwrap()
    }

    #[test]
    fn test_literals() {
        assert_eq!(run("42"), Some(Operand::Integer(42)));
        assert_eq!(run("\"abc\""), Some(Operand::string("abc")));
        assert_eq!(run("true"), Some(Operand::Boolean(true)));
    }

    #[test]
    fn test_empty_program_has_no_value() {
        assert_eq!(run(""), None);
        assert_eq!(run("-- comment"), None);
        assert_eq!(run("x <- 1"), None);
    }

    #[test]
    fn test_block_value_is_last() {
        assert_eq!(run("{ 1 2 3 }"), Some(Operand::Integer(3)));
    }

    #[test]
    fn test_selection_without_match_has_no_value() {
        assert_eq!(run("when false -> 1"), None);
        let err = Interpreter::new()
            .program("1 + when false -> 1")
            .unwrap_err();
        assert!(matches!(err, Error::NoValue { .. }));
    }

    #[test]
    fn test_guard_must_be_boolean() {
        let err = Interpreter::new().program("when 1 -> 2").unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_while_loop() {
        assert_eq!(
            run("i <- 0 total <- 0 while i < 5 { i <- i + 1 total <- total + i } total"),
            Some(Operand::Integer(15))
        );
    }

    #[test]
    fn test_constants_bound() {
        assert_eq!(run("PI"), Some(Operand::Real(std::f64::consts::PI)));
        assert_eq!(run("π"), Some(Operand::Real(std::f64::consts::PI)));
        assert_eq!(run("e"), Some(Operand::Real(std::f64::consts::E)));
    }

    #[test]
    fn test_program_cache_shares_ast() {
        let mut interp = Interpreter::new();
        let a = interp.parse("1 + 2").unwrap();
        let b = interp.parse("1 + 2").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_stack_overflow_is_reported() {
        let mut interp =
            Interpreter::with_config(InterpreterConfig::default().with_max_call_depth(200));
        let err = interp.program("f() { f() } f()").unwrap_err();
        assert_eq!(err, Error::StackOverflow { depth: 200 });
    }

    #[test]
    fn test_not_callable() {
        let err = Interpreter::new().program("x <- 3 x(1)").unwrap_err();
        assert!(matches!(err, Error::NotCallable { .. }));
    }

    const MAKE_INCREMENT: &str = r#"
mk(xs:list) : function {
  inc(n:integer) : integer { length(xs) + n }
  inc
}
"#;

    #[test]
    fn test_nested_named_function_frame_is_collected() {
        let data = Rc::new(vec![Operand::Integer(1), Operand::Integer(2)]);
        let mut interp = Interpreter::new();
        interp.bind("data", Operand::List(data.clone()));
        interp.program(MAKE_INCREMENT).unwrap();
        assert_eq!(
            interp.program("mk(data)(1)").unwrap(),
            Some(Operand::Integer(3))
        );
        interp.program("data <- 0").unwrap();

        // The call frame and `inc` only reference each other now
        assert_eq!(Rc::strong_count(&data), 2);
        assert_eq!(interp.collect_garbage(), 1);
        assert_eq!(Rc::strong_count(&data), 1);
    }

    #[test]
    fn test_escaped_closure_survives_collection() {
        let mut interp = Interpreter::new();
        let source = r#"
mkcounter(start:integer) : function {
  count <- start
  counter(n:integer) : integer { count <- count + n  count }
  counter
}
c is mkcounter(10)
c(1)
"#;
        interp.program(source).unwrap();
        interp.collect_garbage();
        assert_eq!(interp.program("c(1) c(1)").unwrap(), Some(Operand::Integer(13)));
    }

    #[test]
    fn test_collection_runs_between_programs() {
        let data = Rc::new(vec![Operand::Integer(5)]);
        let mut interp = Interpreter::new();
        interp.bind("data", Operand::List(data.clone()));
        interp.program(MAKE_INCREMENT).unwrap();
        for _ in 0..2_000 {
            interp.program("mk(data)(1)").unwrap();
        }
        // Each call leaves a cycle behind until the next automatic collection
        assert!(Rc::strong_count(&data) < 600);
        interp.collect_garbage();
        assert_eq!(Rc::strong_count(&data), 2);
    }
}
