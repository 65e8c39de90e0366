//! A small bytecode interpreter for generated classes.
//!
//! Executes exactly the instruction subset and the Java library calls the
//! generator emits. Values are modeled, not slots: a `double` is a single
//! [`Value::Double`], but it counts as two slots when checking the operand
//! stack against `max_stack`.
//!
//! Calls between generated methods push a frame on an explicit stack
//! instead of recursing, so call depth is bounded by `MAX_CALL_DEPTH` and
//! not by the test thread's stack.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use quill_jvm::opcodes as op;

use super::class_reader::{Class, Constant, Method};

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Double(f64),
    Null,
    Str(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    /// Instance of a generated class.
    Object(Rc<Object>),
    Builder(Rc<RefCell<String>>),
    /// `System.out`
    Out,
    /// `System.in`
    In,
    Scanner,
}

#[derive(Debug, PartialEq)]
pub struct Object {
    pub class: String,
    pub fields: RefCell<HashMap<String, Value>>,
}

impl Object {
    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }
}

impl Value {
    fn slots(&self) -> usize {
        match self {
            Value::Double(_) => 2,
            _ => 1,
        }
    }

    pub fn str(text: &str) -> Value {
        Value::Str(Rc::from(text))
    }
}

/// Abrupt completion of a method, mirroring the Java exception that would
/// have been thrown, or a verification failure of the code itself.
#[derive(Clone, Debug, PartialEq)]
pub enum Trap {
    NullPointer,
    ArrayIndexOutOfBounds(i32),
    NegativeArraySize(i32),
    Arithmetic,
    InputMismatch,
    NoSuchElement,
    StackOverflow,
    OutOfFuel,
    /// Bytecode the JVM verifier would reject.
    Verify(String),
}

const MAX_CALL_DEPTH: usize = 4096;
const FUEL: u64 = 5_000_000;

pub struct Vm<'c> {
    /// The unit's class; statics live here.
    class: &'c Class,
    /// Every loaded class by internal name, the unit's class included.
    classes: HashMap<&'c str, &'c Class>,
    statics: HashMap<String, Value>,
    input: VecDeque<String>,
    pub stdout: String,
    /// Deepest operand stack seen per `name+descriptor`, in slots.
    pub peak_stack: HashMap<String, usize>,
    depth: usize,
    fuel: u64,
}

fn verify(message: impl Into<String>) -> Trap {
    Trap::Verify(message.into())
}

fn default_value(descriptor: &str) -> Value {
    match descriptor {
        "I" | "Z" | "C" => Value::Int(0),
        "F" => Value::Float(0.0),
        _ => Value::Null,
    }
}

/// Number of arguments in a method descriptor.
fn arg_count(descriptor: &str) -> Result<usize, Trap> {
    let params = descriptor
        .strip_prefix('(')
        .and_then(|d| d.split(')').next())
        .ok_or_else(|| verify(format!("bad descriptor {descriptor}")))?;
    let mut count = 0;
    let mut chars = params.chars();
    while let Some(c) = chars.next() {
        match c {
            '[' => continue,
            'L' => {
                for c in chars.by_ref() {
                    if c == ';' {
                        break;
                    }
                }
            }
            _ => {}
        }
        count += 1;
    }
    Ok(count)
}

/// `Float.toString` for the values tests print.
pub fn java_float(value: f32) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        let text = format!("{value}");
        if text.contains('.') {
            text
        } else {
            format!("{text}.0")
        }
    } else {
        let text = format!("{value:e}");
        let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
        if mantissa.contains('.') {
            format!("{mantissa}E{exponent}")
        } else {
            format!("{mantissa}.0E{exponent}")
        }
    }
}

/// How a frame stopped running.
enum Exit<'c> {
    Call {
        class: &'c Class,
        method: &'c Method,
        args: Vec<Value>,
    },
    Return(Option<Value>),
}

struct Frame<'c> {
    class: &'c Class,
    method: &'c Method,
    key: String,
    locals: Vec<Value>,
    stack: Vec<Value>,
    depth: usize,
    peak: usize,
    pc: usize,
}

impl Frame<'_> {
    fn push(&mut self, value: Value) -> Result<(), Trap> {
        self.depth += value.slots();
        self.peak = self.peak.max(self.depth);
        if self.depth > usize::from(self.method.max_stack) {
            return Err(verify(format!(
                "{}: stack depth {} exceeds max_stack {}",
                self.key, self.depth, self.method.max_stack
            )));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, Trap> {
        let value = self
            .stack
            .pop()
            .ok_or_else(|| verify(format!("{}: pop from empty stack", self.key)))?;
        self.depth -= value.slots();
        Ok(value)
    }

    fn pop_int(&mut self) -> Result<i32, Trap> {
        match self.pop()? {
            Value::Int(v) => Ok(v),
            other => Err(verify(format!("{}: expected int, found {other:?}", self.key))),
        }
    }

    fn pop_float(&mut self) -> Result<f32, Trap> {
        match self.pop()? {
            Value::Float(v) => Ok(v),
            other => Err(verify(format!("{}: expected float, found {other:?}", self.key))),
        }
    }

    fn pop_array(&mut self) -> Result<Rc<RefCell<Vec<Value>>>, Trap> {
        match self.pop()? {
            Value::Array(a) => Ok(a),
            Value::Null => Err(Trap::NullPointer),
            other => Err(verify(format!("{}: expected array, found {other:?}", self.key))),
        }
    }

    fn u8(&mut self) -> Result<u8, Trap> {
        let byte = *self
            .method
            .code
            .get(self.pc)
            .ok_or_else(|| verify(format!("{}: fell off the end of the code", self.key)))?;
        self.pc += 1;
        Ok(byte)
    }

    fn u16(&mut self) -> Result<u16, Trap> {
        Ok(u16::from_be_bytes([self.u8()?, self.u8()?]))
    }

    fn load(&mut self, index: usize) -> Result<(), Trap> {
        let value = self
            .locals
            .get(index)
            .cloned()
            .ok_or_else(|| verify(format!("{}: local {index} >= max_locals", self.key)))?;
        self.push(value)
    }

    fn store(&mut self, index: usize) -> Result<(), Trap> {
        let value = self.pop()?;
        let slot = self
            .locals
            .get_mut(index)
            .ok_or_else(|| verify(format!("{}: local {index} >= max_locals", self.key)))?;
        *slot = value;
        Ok(())
    }

    /// Jump relative to the opcode at `at` when `taken`.
    fn branch(&mut self, at: usize, taken: bool) -> Result<(), Trap> {
        let offset = i16::from_be_bytes([self.u8()?, self.u8()?]);
        if taken {
            let target = at as i64 + i64::from(offset);
            self.pc = usize::try_from(target)
                .map_err(|_| verify(format!("{}: branch to {target}", self.key)))?;
        }
        Ok(())
    }
}

impl<'c> Vm<'c> {
    /// Load `classes`, the first being the unit's class, set up its statics
    /// and run `<clinit>`.
    pub fn new(classes: &'c [Class], input: &str) -> Result<Self, Trap> {
        let class = classes
            .first()
            .ok_or_else(|| verify("no class to load"))?;
        let statics = class
            .fields
            .iter()
            .map(|f| (f.name.clone(), default_value(&f.descriptor)))
            .collect();
        let mut vm = Vm {
            class,
            classes: classes.iter().map(|c| (c.name.as_str(), c)).collect(),
            statics,
            input: input.split_whitespace().map(str::to_owned).collect(),
            stdout: String::new(),
            peak_stack: HashMap::new(),
            depth: 0,
            fuel: FUEL,
        };
        if class.method("<clinit>", "()V").is_some() {
            vm.invoke("<clinit>", "()V", Vec::new())?;
        }
        Ok(vm)
    }

    pub fn get_static(&self, name: &str) -> Option<&Value> {
        self.statics.get(name)
    }

    /// Invoke a static method of the unit's class.
    pub fn invoke(
        &mut self,
        name: &str,
        descriptor: &str,
        args: Vec<Value>,
    ) -> Result<Option<Value>, Trap> {
        let class = self.class;
        let method = class
            .method(name, descriptor)
            .ok_or_else(|| verify(format!("no method {name}{descriptor}")))?;
        self.call(class, method, args)
    }

    /// Run `method` and every call it makes to completion.
    fn call(
        &mut self,
        class: &'c Class,
        method: &'c Method,
        args: Vec<Value>,
    ) -> Result<Option<Value>, Trap> {
        let base = self.depth;
        let mut frames = Vec::new();
        let result = self.drive(&mut frames, class, method, args);
        for frame in &frames {
            self.record_peak(frame);
        }
        self.depth = base;
        result
    }

    fn drive(
        &mut self,
        frames: &mut Vec<Frame<'c>>,
        class: &'c Class,
        method: &'c Method,
        args: Vec<Value>,
    ) -> Result<Option<Value>, Trap> {
        self.enter(frames, class, method, args)?;
        loop {
            let Some(frame) = frames.last_mut() else {
                return Err(verify("no frame to run"));
            };
            match self.run(frame)? {
                Exit::Call {
                    class,
                    method,
                    args,
                } => self.enter(frames, class, method, args)?,
                Exit::Return(value) => {
                    if let Some(done) = frames.pop() {
                        self.record_peak(&done);
                    }
                    self.depth -= 1;
                    match (frames.last_mut(), value) {
                        (None, value) => return Ok(value),
                        (Some(caller), Some(value)) => caller.push(value)?,
                        (Some(_), None) => {}
                    }
                }
            }
        }
    }

    fn enter(
        &mut self,
        frames: &mut Vec<Frame<'c>>,
        class: &'c Class,
        method: &'c Method,
        args: Vec<Value>,
    ) -> Result<(), Trap> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(Trap::StackOverflow);
        }
        let key = if std::ptr::eq(class, self.class) {
            format!("{}{}", method.name, method.descriptor)
        } else {
            format!("{}.{}{}", class.name, method.name, method.descriptor)
        };
        let mut locals = vec![Value::Null; usize::from(method.max_locals)];
        if args.len() > locals.len() {
            return Err(verify(format!("{key}: arguments exceed max_locals")));
        }
        for (slot, arg) in locals.iter_mut().zip(args) {
            *slot = arg;
        }
        frames.push(Frame {
            class,
            method,
            key,
            locals,
            stack: Vec::new(),
            depth: 0,
            peak: 0,
            pc: 0,
        });
        self.depth += 1;
        Ok(())
    }

    fn record_peak(&mut self, frame: &Frame<'_>) {
        let peak = self.peak_stack.entry(frame.key.clone()).or_insert(0);
        *peak = (*peak).max(frame.peak);
    }

    /// Execute `f` until it returns or calls another generated method.
    #[allow(clippy::too_many_lines)]
    fn run(&mut self, f: &mut Frame<'c>) -> Result<Exit<'c>, Trap> {
        loop {
            self.fuel = self.fuel.checked_sub(1).ok_or(Trap::OutOfFuel)?;
            let at = f.pc;
            let opcode = f.u8()?;
            match opcode {
                op::ACONST_NULL => f.push(Value::Null)?,
                op::ICONST_M1..=0x08 => f.push(Value::Int(i32::from(opcode) - 3))?,
                op::FCONST_0..=op::FCONST_2 => {
                    f.push(Value::Float(f32::from(opcode - op::FCONST_0)))?;
                }
                op::BIPUSH => {
                    let value = f.u8()? as i8;
                    f.push(Value::Int(i32::from(value)))?;
                }
                op::SIPUSH => {
                    let value = f.u16()? as i16;
                    f.push(Value::Int(i32::from(value)))?;
                }
                op::LDC => {
                    let index = u16::from(f.u8()?);
                    let value = constant(f.class, index)?;
                    f.push(value)?;
                }
                op::LDC_W => {
                    let index = f.u16()?;
                    let value = constant(f.class, index)?;
                    f.push(value)?;
                }
                op::ILOAD | op::FLOAD | op::ALOAD => {
                    let index = usize::from(f.u8()?);
                    f.load(index)?;
                }
                op::ILOAD_0..=0x1d => f.load(usize::from(opcode - op::ILOAD_0))?,
                op::FLOAD_0..=0x25 => f.load(usize::from(opcode - op::FLOAD_0))?,
                op::ALOAD_0..=0x2d => f.load(usize::from(opcode - op::ALOAD_0))?,
                op::ISTORE | op::FSTORE | op::ASTORE => {
                    let index = usize::from(f.u8()?);
                    f.store(index)?;
                }
                op::ISTORE_0..=0x3e => f.store(usize::from(opcode - op::ISTORE_0))?,
                op::FSTORE_0..=0x46 => f.store(usize::from(opcode - op::FSTORE_0))?,
                op::ASTORE_0..=0x4e => f.store(usize::from(opcode - op::ASTORE_0))?,
                op::WIDE => {
                    let inner = f.u8()?;
                    let index = usize::from(f.u16()?);
                    match inner {
                        op::ILOAD | op::FLOAD | op::ALOAD => f.load(index)?,
                        op::ISTORE | op::FSTORE | op::ASTORE => f.store(index)?,
                        other => return Err(verify(format!("wide {other:#x}"))),
                    }
                }
                op::IALOAD | op::FALOAD | op::AALOAD | op::BALOAD => {
                    let index = f.pop_int()?;
                    let array = f.pop_array()?;
                    let value = usize::try_from(index)
                        .ok()
                        .and_then(|i| array.borrow().get(i).cloned())
                        .ok_or(Trap::ArrayIndexOutOfBounds(index))?;
                    f.push(value)?;
                }
                op::IASTORE | op::FASTORE | op::AASTORE | op::BASTORE => {
                    let value = f.pop()?;
                    let index = f.pop_int()?;
                    let array = f.pop_array()?;
                    let mut elems = array.borrow_mut();
                    let slot = usize::try_from(index)
                        .ok()
                        .and_then(|i| elems.get_mut(i))
                        .ok_or(Trap::ArrayIndexOutOfBounds(index))?;
                    *slot = value;
                }
                op::POP => {
                    f.pop()?;
                }
                op::POP2 => {
                    if f.pop()?.slots() == 1 {
                        f.pop()?;
                    }
                }
                op::DUP => {
                    let value = f.pop()?;
                    f.push(value.clone())?;
                    f.push(value)?;
                }
                op::IADD | op::ISUB | op::IMUL | op::IDIV | op::IREM | op::IXOR => {
                    let right = f.pop_int()?;
                    let left = f.pop_int()?;
                    let value = match opcode {
                        op::IADD => left.wrapping_add(right),
                        op::ISUB => left.wrapping_sub(right),
                        op::IMUL => left.wrapping_mul(right),
                        op::IXOR => left ^ right,
                        _ if right == 0 => return Err(Trap::Arithmetic),
                        op::IDIV => left.wrapping_div(right),
                        _ => left.wrapping_rem(right),
                    };
                    f.push(Value::Int(value))?;
                }
                op::FADD | op::FSUB | op::FMUL | op::FDIV | op::FREM => {
                    let right = f.pop_float()?;
                    let left = f.pop_float()?;
                    let value = match opcode {
                        op::FADD => left + right,
                        op::FSUB => left - right,
                        op::FMUL => left * right,
                        op::FDIV => left / right,
                        _ => left % right,
                    };
                    f.push(Value::Float(value))?;
                }
                op::INEG => {
                    let value = f.pop_int()?;
                    f.push(Value::Int(value.wrapping_neg()))?;
                }
                op::FNEG => {
                    let value = f.pop_float()?;
                    f.push(Value::Float(-value))?;
                }
                op::I2F => {
                    let value = f.pop_int()?;
                    f.push(Value::Float(value as f32))?;
                }
                op::I2C => {
                    let value = f.pop_int()?;
                    f.push(Value::Int(i32::from(value as u16)))?;
                }
                op::F2D => {
                    let value = f.pop_float()?;
                    f.push(Value::Double(f64::from(value)))?;
                }
                op::D2I => match f.pop()? {
                    Value::Double(value) => f.push(Value::Int(value as i32))?,
                    other => return Err(verify(format!("d2i on {other:?}"))),
                },
                op::FCMPL | op::FCMPG => {
                    let right = f.pop_float()?;
                    let left = f.pop_float()?;
                    let value = match left.partial_cmp(&right) {
                        Some(std::cmp::Ordering::Less) => -1,
                        Some(std::cmp::Ordering::Equal) => 0,
                        Some(std::cmp::Ordering::Greater) => 1,
                        None if opcode == op::FCMPG => 1,
                        None => -1,
                    };
                    f.push(Value::Int(value))?;
                }
                op::IFEQ..=op::IFLE => {
                    let value = f.pop_int()?;
                    let taken = match opcode {
                        op::IFEQ => value == 0,
                        op::IFNE => value != 0,
                        op::IFLT => value < 0,
                        op::IFGE => value >= 0,
                        op::IFGT => value > 0,
                        _ => value <= 0,
                    };
                    f.branch(at, taken)?;
                }
                op::IF_ICMPEQ..=op::IF_ICMPLE => {
                    let right = f.pop_int()?;
                    let left = f.pop_int()?;
                    let taken = match opcode {
                        op::IF_ICMPEQ => left == right,
                        op::IF_ICMPNE => left != right,
                        op::IF_ICMPLT => left < right,
                        op::IF_ICMPGE => left >= right,
                        op::IF_ICMPGT => left > right,
                        _ => left <= right,
                    };
                    f.branch(at, taken)?;
                }
                op::IF_ACMPEQ | op::IF_ACMPNE => {
                    let right = f.pop()?;
                    let left = f.pop()?;
                    let same = same_reference(&left, &right);
                    f.branch(at, same == (opcode == op::IF_ACMPEQ))?;
                }
                op::GOTO => f.branch(at, true)?,
                op::IRETURN | op::FRETURN | op::ARETURN => {
                    let value = f.pop()?;
                    return Ok(Exit::Return(Some(value)));
                }
                op::RETURN => return Ok(Exit::Return(None)),
                op::GETSTATIC => {
                    let index = f.u16()?;
                    let value = self.get_static_field(f.class, index)?;
                    f.push(value)?;
                }
                op::PUTSTATIC => {
                    let index = f.u16()?;
                    let value = f.pop()?;
                    let owner = f.class;
                    let (class, name, _) = owner.member_ref(index).map_err(verify)?;
                    if class != self.class.name || !self.statics.contains_key(name) {
                        return Err(verify(format!("putstatic {class}.{name}")));
                    }
                    self.statics.insert(name.to_owned(), value);
                }
                op::GETFIELD => {
                    let index = f.u16()?;
                    let object = pop_object(f)?;
                    let class = f.class;
                    let (_, name, _) = class.member_ref(index).map_err(verify)?;
                    let value = object
                        .field(name)
                        .ok_or_else(|| verify(format!("{} has no field {name}", object.class)))?;
                    f.push(value)?;
                }
                op::PUTFIELD => {
                    let index = f.u16()?;
                    let value = f.pop()?;
                    let object = pop_object(f)?;
                    let class = f.class;
                    let (_, name, _) = class.member_ref(index).map_err(verify)?;
                    let mut fields = object.fields.borrow_mut();
                    let slot = fields
                        .get_mut(name)
                        .ok_or_else(|| verify(format!("{} has no field {name}", object.class)))?;
                    *slot = value;
                }
                op::INVOKEVIRTUAL | op::INVOKESPECIAL | op::INVOKESTATIC => {
                    let index = f.u16()?;
                    let class = f.class;
                    let (owner, name, descriptor) = class.member_ref(index).map_err(verify)?;
                    let mut args = Vec::new();
                    for _ in 0..arg_count(descriptor)? {
                        args.push(f.pop()?);
                    }
                    args.reverse();
                    let receiver = if opcode == op::INVOKESTATIC {
                        None
                    } else {
                        Some(f.pop()?)
                    };
                    if let Some(&target) = self.classes.get(owner) {
                        let method = target
                            .method(name, descriptor)
                            .ok_or_else(|| verify(format!("no method {owner}.{name}{descriptor}")))?;
                        if let Some(receiver) = receiver {
                            if receiver == Value::Null {
                                return Err(Trap::NullPointer);
                            }
                            args.insert(0, receiver);
                        }
                        return Ok(Exit::Call {
                            class: target,
                            method,
                            args,
                        });
                    }
                    if let Some(value) = self.library(owner, name, descriptor, receiver, args)? {
                        f.push(value)?;
                    }
                }
                op::NEW => {
                    let index = f.u16()?;
                    let value = match f.class.class_name(index).map_err(verify)? {
                        "java/lang/StringBuilder" => Value::Builder(Rc::default()),
                        "java/util/Scanner" => Value::Scanner,
                        name => self.instantiate(name)?,
                    };
                    f.push(value)?;
                }
                op::NEWARRAY => {
                    let atype = f.u8()?;
                    let len = f.pop_int()?;
                    let zero = match atype {
                        op::T_INT | op::T_BOOLEAN => Value::Int(0),
                        op::T_FLOAT => Value::Float(0.0),
                        other => return Err(verify(format!("newarray type {other}"))),
                    };
                    let len = usize::try_from(len).map_err(|_| Trap::NegativeArraySize(len))?;
                    f.push(Value::Array(Rc::new(RefCell::new(vec![zero; len]))))?;
                }
                op::ANEWARRAY => {
                    f.u16()?;
                    let len = f.pop_int()?;
                    let len = usize::try_from(len).map_err(|_| Trap::NegativeArraySize(len))?;
                    f.push(Value::Array(Rc::new(RefCell::new(vec![Value::Null; len]))))?;
                }
                op::ARRAYLENGTH => {
                    let array = f.pop_array()?;
                    let len = i32::try_from(array.borrow().len()).map_err(|_| verify("len"))?;
                    f.push(Value::Int(len))?;
                }
                op::ATHROW => {
                    f.pop()?;
                    return Err(Trap::NullPointer);
                }
                other => return Err(verify(format!("unsupported opcode {other:#x} at {at}"))),
            }
        }
    }

    /// A fresh instance of a loaded class with every field zeroed.
    fn instantiate(&self, name: &str) -> Result<Value, Trap> {
        let class = self
            .classes
            .get(name)
            .ok_or_else(|| verify(format!("new {name}")))?;
        let fields = class
            .fields
            .iter()
            .map(|f| (f.name.clone(), default_value(&f.descriptor)))
            .collect();
        Ok(Value::Object(Rc::new(Object {
            class: class.name.clone(),
            fields: RefCell::new(fields),
        })))
    }

    fn get_static_field(&self, class: &Class, index: u16) -> Result<Value, Trap> {
        let (owner, name, _) = class.member_ref(index).map_err(verify)?;
        match (owner, name) {
            ("java/lang/System", "out") => Ok(Value::Out),
            ("java/lang/System", "in") => Ok(Value::In),
            _ if owner == self.class.name => self
                .statics
                .get(name)
                .cloned()
                .ok_or_else(|| verify(format!("no field {name}"))),
            _ => Err(verify(format!("getstatic {owner}.{name}"))),
        }
    }

    fn next_token(&mut self) -> Result<String, Trap> {
        self.input.pop_front().ok_or(Trap::NoSuchElement)
    }

    /// `String.valueOf(Object)`: runs the generated `toString` of objects.
    fn object_text(&mut self, value: &Value) -> Result<String, Trap> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            Value::Null => Ok("null".to_owned()),
            Value::Array(_) => Ok("[array]".to_owned()),
            Value::Object(object) => {
                let class = self
                    .classes
                    .get(object.class.as_str())
                    .copied()
                    .ok_or_else(|| verify(format!("no class {}", object.class)))?;
                let method = class
                    .method("toString", "()Ljava/lang/String;")
                    .ok_or_else(|| verify(format!("{} has no toString", class.name)))?;
                match self.call(class, method, vec![value.clone()])? {
                    Some(Value::Str(s)) => Ok(s.to_string()),
                    other => Err(verify(format!("toString returned {other:?}"))),
                }
            }
            other => Err(verify(format!("String.valueOf({other:?})"))),
        }
    }

    /// `java.util.Arrays.toString` under the overload `descriptor`.
    fn array_text(&mut self, descriptor: &str, array: &Value) -> Result<String, Trap> {
        let elems = match array {
            Value::Null => return Ok("null".to_owned()),
            Value::Array(elems) => elems.borrow().clone(),
            other => return Err(verify(format!("Arrays.toString({other:?})"))),
        };
        let mut parts = Vec::with_capacity(elems.len());
        for elem in &elems {
            let text = match (descriptor, elem) {
                ("([I)Ljava/lang/String;", Value::Int(v)) => v.to_string(),
                ("([Z)Ljava/lang/String;", Value::Int(v)) => (*v != 0).to_string(),
                ("([F)Ljava/lang/String;", Value::Float(v)) => java_float(*v),
                ("([Ljava/lang/Object;)Ljava/lang/String;", elem) => self.object_text(elem)?,
                (descriptor, elem) => {
                    return Err(verify(format!("Arrays.toString{descriptor} of {elem:?}")))
                }
            };
            parts.push(text);
        }
        Ok(format!("[{}]", parts.join(", ")))
    }

    /// Text `PrintStream.print` writes for `value` under the overload
    /// `descriptor`.
    fn display(&mut self, value: &Value, descriptor: &str) -> Result<String, Trap> {
        Ok(match (descriptor, value) {
            ("(I)V", Value::Int(v)) => v.to_string(),
            ("(Z)V", Value::Int(v)) => (*v != 0).to_string(),
            ("(C)V", Value::Int(v)) => {
                String::from_utf16_lossy(&[u16::try_from(*v).map_err(|_| verify("char"))?])
            }
            ("(F)V", Value::Float(v)) => java_float(*v),
            ("(Ljava/lang/String;)V", Value::Str(s)) => s.to_string(),
            ("(Ljava/lang/String;)V", Value::Null) => "null".to_owned(),
            ("(Ljava/lang/Object;)V", value) => self.object_text(value)?,
            (descriptor, value) => return Err(verify(format!("print{descriptor} of {value:?}"))),
        })
    }

    fn library(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
        receiver: Option<Value>,
        args: Vec<Value>,
    ) -> Result<Option<Value>, Trap> {
        if matches!(receiver, Some(Value::Null)) {
            return Err(Trap::NullPointer);
        }
        let arg = args.into_iter().next();
        Ok(match (class, name, descriptor, receiver, arg) {
            ("java/io/PrintStream", "print" | "println", _, Some(Value::Out), arg) => {
                if let Some(arg) = arg {
                    let text = self.display(&arg, descriptor)?;
                    self.stdout.push_str(&text);
                }
                if name == "println" {
                    self.stdout.push('\n');
                }
                None
            }
            ("java/lang/Object", "<init>", "()V", Some(Value::Object(_)), None) => None,
            ("java/lang/String", "length", "()I", Some(Value::Str(s)), None) => {
                Some(Value::Int(i32::try_from(s.encode_utf16().count()).unwrap_or(i32::MAX)))
            }
            ("java/lang/String", "equals", _, Some(Value::Str(s)), Some(other)) => {
                let equal = matches!(&other, Value::Str(o) if *o == s);
                Some(Value::Int(i32::from(equal)))
            }
            ("java/lang/String", "valueOf", "(C)Ljava/lang/String;", None, Some(Value::Int(c))) => {
                let c = u16::try_from(c).map_err(|_| verify("char out of range"))?;
                Some(Value::Str(Rc::from(String::from_utf16_lossy(&[c]))))
            }
            ("java/lang/Math", "floor", "(D)D", None, Some(Value::Double(d))) => {
                Some(Value::Double(d.floor()))
            }
            ("java/util/Arrays", "toString", _, None, Some(array)) => {
                Some(Value::str(&self.array_text(descriptor, &array)?))
            }
            ("java/lang/StringBuilder", "<init>", "()V", Some(Value::Builder(_)), None) => None,
            (
                "java/lang/StringBuilder",
                "<init>",
                "(Ljava/lang/String;)V",
                Some(Value::Builder(b)),
                Some(Value::Str(s)),
            ) => {
                b.borrow_mut().push_str(&s);
                None
            }
            ("java/lang/StringBuilder", "append", _, Some(Value::Builder(b)), Some(arg)) => {
                let text = match (descriptor, &arg) {
                    ("(I)Ljava/lang/StringBuilder;", Value::Int(v)) => v.to_string(),
                    ("(Z)Ljava/lang/StringBuilder;", Value::Int(v)) => (*v != 0).to_string(),
                    ("(F)Ljava/lang/StringBuilder;", Value::Float(v)) => java_float(*v),
                    (_, Value::Str(_) | Value::Null | Value::Object(_)) => self.object_text(&arg)?,
                    (descriptor, other) => {
                        return Err(verify(format!("append{descriptor} of {other:?}")))
                    }
                };
                b.borrow_mut().push_str(&text);
                Some(Value::Builder(b))
            }
            ("java/lang/StringBuilder", "toString", _, Some(Value::Builder(b)), None) => {
                Some(Value::Str(Rc::from(b.borrow().as_str())))
            }
            ("java/util/Scanner", "<init>", _, Some(Value::Scanner), Some(Value::In)) => None,
            ("java/util/Scanner", "nextInt", "()I", Some(Value::Scanner), None) => {
                let token = self.next_token()?;
                Some(Value::Int(token.parse().map_err(|_| Trap::InputMismatch)?))
            }
            ("java/util/Scanner", "nextFloat", "()F", Some(Value::Scanner), None) => {
                let token = self.next_token()?;
                Some(Value::Float(token.parse().map_err(|_| Trap::InputMismatch)?))
            }
            ("java/util/Scanner", "next", _, Some(Value::Scanner), None) => {
                Some(Value::Str(Rc::from(self.next_token()?)))
            }
            (class, name, descriptor, receiver, arg) => {
                return Err(verify(format!(
                    "unsupported call {class}.{name}{descriptor} on {receiver:?} with {arg:?}"
                )))
            }
        })
    }
}

fn constant(class: &Class, index: u16) -> Result<Value, Trap> {
    match class.constants.get(usize::from(index)) {
        Some(Constant::Integer(v)) => Ok(Value::Int(*v)),
        Some(Constant::Float(v)) => Ok(Value::Float(*v)),
        Some(Constant::String(utf8)) => Ok(Value::str(class.utf8(*utf8).map_err(verify)?)),
        other => Err(verify(format!("ldc of {other:?}"))),
    }
}

fn pop_object(f: &mut Frame<'_>) -> Result<Rc<Object>, Trap> {
    match f.pop()? {
        Value::Object(object) => Ok(object),
        Value::Null => Err(Trap::NullPointer),
        other => Err(verify(format!("{}: expected object, found {other:?}", f.key))),
    }
}

fn same_reference(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
        (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
        (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b),
        (Value::Builder(a), Value::Builder(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}
