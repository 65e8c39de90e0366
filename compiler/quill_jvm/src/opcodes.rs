//! JVM opcodes used by the generator.

pub const ACONST_NULL: u8 = 0x01;
pub const ICONST_M1: u8 = 0x02;
pub const ICONST_0: u8 = 0x03;
pub const ICONST_1: u8 = 0x04;
pub const FCONST_0: u8 = 0x0b;
pub const FCONST_1: u8 = 0x0c;
pub const FCONST_2: u8 = 0x0d;
pub const BIPUSH: u8 = 0x10;
pub const SIPUSH: u8 = 0x11;
pub const LDC: u8 = 0x12;
pub const LDC_W: u8 = 0x13;

pub const ILOAD: u8 = 0x15;
pub const FLOAD: u8 = 0x17;
pub const ALOAD: u8 = 0x19;
pub const ILOAD_0: u8 = 0x1a;
pub const FLOAD_0: u8 = 0x22;
pub const ALOAD_0: u8 = 0x2a;
pub const IALOAD: u8 = 0x2e;
pub const FALOAD: u8 = 0x30;
pub const AALOAD: u8 = 0x32;
pub const BALOAD: u8 = 0x33;

pub const ISTORE: u8 = 0x36;
pub const FSTORE: u8 = 0x38;
pub const ASTORE: u8 = 0x3a;
pub const ISTORE_0: u8 = 0x3b;
pub const FSTORE_0: u8 = 0x43;
pub const ASTORE_0: u8 = 0x4b;
pub const IASTORE: u8 = 0x4f;
pub const FASTORE: u8 = 0x51;
pub const AASTORE: u8 = 0x53;
pub const BASTORE: u8 = 0x54;

pub const POP: u8 = 0x57;
pub const POP2: u8 = 0x58;
pub const DUP: u8 = 0x59;

pub const IADD: u8 = 0x60;
pub const FADD: u8 = 0x62;
pub const ISUB: u8 = 0x64;
pub const FSUB: u8 = 0x66;
pub const IMUL: u8 = 0x68;
pub const FMUL: u8 = 0x6a;
pub const IDIV: u8 = 0x6c;
pub const FDIV: u8 = 0x6e;
pub const IREM: u8 = 0x70;
pub const FREM: u8 = 0x72;
pub const INEG: u8 = 0x74;
pub const FNEG: u8 = 0x76;
pub const IXOR: u8 = 0x82;

pub const I2F: u8 = 0x86;
pub const F2D: u8 = 0x8d;
pub const D2I: u8 = 0x8e;
pub const I2C: u8 = 0x92;

pub const FCMPL: u8 = 0x95;
pub const FCMPG: u8 = 0x96;
pub const IFEQ: u8 = 0x99;
pub const IFNE: u8 = 0x9a;
pub const IFLT: u8 = 0x9b;
pub const IFGE: u8 = 0x9c;
pub const IFGT: u8 = 0x9d;
pub const IFLE: u8 = 0x9e;
pub const IF_ICMPEQ: u8 = 0x9f;
pub const IF_ICMPNE: u8 = 0xa0;
pub const IF_ICMPLT: u8 = 0xa1;
pub const IF_ICMPGE: u8 = 0xa2;
pub const IF_ICMPGT: u8 = 0xa3;
pub const IF_ICMPLE: u8 = 0xa4;
pub const IF_ACMPEQ: u8 = 0xa5;
pub const IF_ACMPNE: u8 = 0xa6;
pub const GOTO: u8 = 0xa7;

pub const IRETURN: u8 = 0xac;
pub const FRETURN: u8 = 0xae;
pub const ARETURN: u8 = 0xb0;
pub const RETURN: u8 = 0xb1;

pub const GETSTATIC: u8 = 0xb2;
pub const PUTSTATIC: u8 = 0xb3;
pub const GETFIELD: u8 = 0xb4;
pub const PUTFIELD: u8 = 0xb5;
pub const INVOKEVIRTUAL: u8 = 0xb6;
pub const INVOKESPECIAL: u8 = 0xb7;
pub const INVOKESTATIC: u8 = 0xb8;
pub const NEW: u8 = 0xbb;
pub const NEWARRAY: u8 = 0xbc;
pub const ANEWARRAY: u8 = 0xbd;
pub const ARRAYLENGTH: u8 = 0xbe;
pub const ATHROW: u8 = 0xbf;
pub const WIDE: u8 = 0xc4;

/// `newarray` element codes.
pub const T_BOOLEAN: u8 = 4;
pub const T_FLOAT: u8 = 6;
pub const T_INT: u8 = 10;

/// Whether `op` is a two-way conditional branch.
pub fn is_conditional_branch(op: u8) -> bool {
    (IFEQ..=IF_ACMPNE).contains(&op)
}

/// Operand-stack slots a conditional branch pops.
pub fn branch_pops(op: u8) -> u16 {
    if (IF_ICMPEQ..=IF_ACMPNE).contains(&op) {
        2
    } else {
        1
    }
}

/// Branch taken when `op` is not.
pub fn negate_branch(op: u8) -> u8 {
    match op {
        IFEQ => IFNE,
        IFNE => IFEQ,
        IFLT => IFGE,
        IFGE => IFLT,
        IFGT => IFLE,
        IFLE => IFGT,
        IF_ICMPEQ => IF_ICMPNE,
        IF_ICMPNE => IF_ICMPEQ,
        IF_ICMPLT => IF_ICMPGE,
        IF_ICMPGE => IF_ICMPLT,
        IF_ICMPGT => IF_ICMPLE,
        IF_ICMPLE => IF_ICMPGT,
        IF_ACMPEQ => IF_ACMPNE,
        IF_ACMPNE => IF_ACMPEQ,
        other => other,
    }
}
