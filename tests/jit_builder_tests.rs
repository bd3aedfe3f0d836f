use minijit::asm::register::GPRegister64::*;
use minijit::asm::{CallingConvention, SystemV};
use minijit::jit::{JitType, Location, Marker, Module, Target, VReg};

fn new_module() -> Module {
    Module::new(Target::X86_64SysV)
}

const PROLOGUE_LEN: usize = 11; // push rbp; mov rbp, rsp; sub rsp, imm32
const FRAME_IMM_OFFSET: usize = 7;

#[test]
fn test_arguments_are_seeded_into_the_sysv_registers() {
    let mut module = new_module();
    let f = module.declare_function();
    let b = module.new_function(f, &[JitType::I64; 6]);

    let expected = [Rdi, Rsi, Rdx, Rcx, R8, R9];
    for (i, &reg) in expected.iter().enumerate() {
        assert_eq!(b.state().vregs.get(b.arg(i)).loc, Location::HostReg(reg));
    }
    b.state().verify_consistency(SystemV.reserved_registers());
}

#[test]
#[should_panic(expected = "at most 6 integer arguments")]
fn test_more_than_six_arguments_is_fatal() {
    let mut module = new_module();
    let f = module.declare_function();
    module.new_function(f, &[JitType::I64; 7]);
}

#[test]
#[should_panic(expected = "only i64 arguments are supported")]
fn test_non_i64_argument_is_fatal() {
    let mut module = new_module();
    let f = module.declare_function();
    module.new_function(f, &[JitType::I32]);
}

#[test]
fn test_immediates_stay_latent_until_used() {
    let mut module = new_module();
    let f = module.declare_function();
    let mut b = module.new_function(f, &[]);
    let before = b.code().len();
    let lit = b.immediate_int64(123);
    let fun = b.immediate_function(f);
    assert_eq!(b.code().len(), before, "creating immediates must not emit code");
    assert_eq!(b.state().vregs.get(lit).loc, Location::Literal(123));
    assert_eq!(b.state().vregs.get(fun).loc, Location::Reloc(f));
}

#[test]
fn test_consistency_holds_across_a_whole_function() {
    let reserved = SystemV.reserved_registers();
    let mut module = new_module();
    let f = module.declare_function();
    let mut b = module.new_function(f, &[JitType::I64, JitType::I64]);
    let entry = b.entry_block();
    b.state().verify_consistency(reserved);

    let x = b.arg(0);
    let y = b.arg(1);
    let one = b.immediate_int64(1);
    b.state().verify_consistency(reserved);
    let sum = b.add(x, y);
    b.state().verify_consistency(reserved);
    let f_ptr = b.immediate_function(f);
    let nested = b.call(f_ptr, &[sum, one], JitType::I64, &[JitType::I64, JitType::I64], false);
    b.state().verify_consistency(reserved);
    let total = b.add(nested, sum);
    b.state().verify_consistency(reserved);

    let done = b.label_marker();
    b.branch_if_equal(done, total, one);
    let cont = b.begin_bb(entry);
    b.state().verify_consistency(reserved);
    b.ret(total, JitType::I64);

    b.begin_bb(cont);
    b.state().verify_consistency(reserved);
    b.label(done);
    b.ret(one, JitType::I64);
    b.finalize_function();
}

#[test]
fn test_forward_label_patch_is_target_minus_site_plus_four() {
    let mut module = new_module();
    let f = module.declare_function();
    let mut b = module.new_function(f, &[]);
    let entry = b.entry_block();
    let target = b.label_marker();
    b.branch(target); // jmp at offset 11, displacement at 12
    b.begin_bb(entry);
    b.label(target); // offset 16
    let void = b.immediate_void();
    b.ret(void, JitType::Void);
    b.finalize_function();

    let bytes = module.function_bytes(f);
    assert_eq!(bytes[PROLOGUE_LEN], 0xE9);
    let rel = i32::from_le_bytes(bytes[12..16].try_into().unwrap());
    assert_eq!(rel, 16 - (12 + 4));
}

#[test]
fn test_backward_label_patch() {
    let mut module = new_module();
    let f = module.declare_function();
    let mut b = module.new_function(f, &[]);
    let entry = b.entry_block();
    let target = b.label_marker();
    b.label(target); // offset 11
    b.branch(target); // displacement at 12; 11 - (12 + 4) = -5
    b.begin_bb(entry);
    let void = b.immediate_void();
    b.ret(void, JitType::Void);
    b.finalize_function();

    let bytes = module.function_bytes(f);
    let rel = i32::from_le_bytes(bytes[12..16].try_into().unwrap());
    assert_eq!(rel, -5);
}

#[test]
fn test_frame_size_is_high_water_rounded_to_sixteen() {
    let mut module = new_module();
    let (caller, callee) = build_spill_stress(&mut module);

    // callee: two of the six arguments get spilled while summing
    let bytes = module.function_bytes(callee);
    let imm = u32::from_le_bytes(bytes[FRAME_IMM_OFFSET..FRAME_IMM_OFFSET + 4].try_into().unwrap());
    assert_eq!(imm, 16);

    // caller: seven live values spilled around the call, 56 bytes high water
    let bytes = module.function_bytes(caller);
    let imm = u32::from_le_bytes(bytes[FRAME_IMM_OFFSET..FRAME_IMM_OFFSET + 4].try_into().unwrap());
    assert_eq!(imm, 64);
}

#[test]
fn test_empty_frame_is_patched_to_zero() {
    let mut module = new_module();
    let f = module.declare_function();
    let mut b = module.new_function(f, &[JitType::I64]);
    let x = b.arg(0);
    b.ret(x, JitType::I64);
    b.finalize_function();

    let bytes = module.function_bytes(f);
    let imm = u32::from_le_bytes(bytes[FRAME_IMM_OFFSET..FRAME_IMM_OFFSET + 4].try_into().unwrap());
    assert_eq!(imm, 0);
}

#[test]
fn test_identical_instruction_sequences_produce_identical_bytes() {
    let build = |module: &mut Module| {
        let (caller, callee) = build_spill_stress(module);
        (caller, callee)
    };
    let mut first = new_module();
    let (caller_a, callee_a) = build(&mut first);
    let mut second = new_module();
    let (caller_b, callee_b) = build(&mut second);

    assert_eq!(first.function_bytes(caller_a), second.function_bytes(caller_b));
    assert_eq!(first.function_bytes(callee_a), second.function_bytes(callee_b));
}

#[test]
fn test_discard_is_an_ignorable_hint() {
    let mut module = new_module();
    let f = module.declare_function();
    let mut b = module.new_function(f, &[JitType::I64]);
    let x = b.arg(0);
    let one = b.immediate_int64(1);
    b.discard(&[one]);
    // the hint must not invalidate anything
    let sum = b.add(x, one);
    b.ret(sum, JitType::I64);
    b.finalize_function();
}

#[test]
#[should_panic(expected = "no basic block is open")]
fn test_emitting_into_a_closed_block_is_fatal() {
    let mut module = new_module();
    let f = module.declare_function();
    let mut b = module.new_function(f, &[]);
    let void = b.immediate_void();
    b.ret(void, JitType::Void);
    b.immediate_int64(1);
}

#[test]
#[should_panic(expected = "while another is open")]
fn test_begin_bb_with_an_open_block_is_fatal() {
    let mut module = new_module();
    let f = module.declare_function();
    let mut b = module.new_function(f, &[]);
    let entry = b.entry_block();
    b.begin_bb(entry);
}

#[test]
#[should_panic(expected = "is not visible in this block")]
fn test_vreg_from_an_unreachable_block_is_fatal() {
    let mut module = new_module();
    let f = module.declare_function();
    let mut b = module.new_function(f, &[JitType::I64]);
    let entry = b.entry_block();
    let x = b.arg(0);
    let zero = b.immediate_int64(0);
    let done = b.label_marker();
    b.branch_if_equal(done, x, zero);

    b.begin_bb(entry);
    let stray = b.immediate_int64(9);
    b.ret(stray, JitType::I64);

    // this block forks from entry and has never seen `stray`
    b.begin_bb(entry);
    b.label(done);
    b.add(stray, stray);
}

#[test]
#[should_panic(expected = "resolved twice")]
fn test_binding_a_label_twice_is_fatal() {
    let mut module = new_module();
    let f = module.declare_function();
    let mut b = module.new_function(f, &[]);
    let target = b.label_marker();
    b.label(target);
    b.label(target);
}

#[test]
#[should_panic(expected = "belongs to another function")]
fn test_label_marker_from_another_function_is_fatal() {
    let mut module = new_module();
    let f = module.declare_function();
    let g = module.declare_function();
    let foreign = {
        let mut b = module.new_function(f, &[]);
        let marker = b.label_marker();
        b.label(marker);
        let void = b.immediate_void();
        b.ret(void, JitType::Void);
        b.finalize_function();
        marker
    };
    let mut b = module.new_function(g, &[]);
    b.branch(foreign);
}

#[test]
#[should_panic(expected = "has no resolving site")]
fn test_unresolved_label_at_finalize_is_fatal() {
    let mut module = new_module();
    let f = module.declare_function();
    let mut b = module.new_function(f, &[]);
    b.label_marker();
    let void = b.immediate_void();
    b.ret(void, JitType::Void);
    b.finalize_function();
}

#[test]
#[should_panic(expected = "open basic block")]
fn test_finalize_with_an_open_block_is_fatal() {
    let mut module = new_module();
    let f = module.declare_function();
    let b = module.new_function(f, &[]);
    b.finalize_function();
}

// Seven live values forced through a six-argument call: at least one value
// must round-trip through the frame on each side.
fn build_spill_stress(module: &mut Module) -> (Marker, Marker) {
    let callee = module.declare_function();
    let caller = module.declare_function();
    let i64x6 = [JitType::I64; 6];

    {
        let mut b = module.new_function(callee, &i64x6);
        let mut sum = b.arg(0);
        for i in 1..6 {
            let next = b.arg(i);
            sum = b.add(sum, next);
        }
        b.ret(sum, JitType::I64);
        b.finalize_function();
    }
    {
        let mut b = module.new_function(caller, &[]);
        let callee_fn = b.immediate_function(callee);
        let mut vals: Vec<VReg> = Vec::new();
        for i in 0..7 {
            let lit = b.immediate_int64(10 * (i + 1));
            let zero = b.immediate_int64(0);
            vals.push(b.add(lit, zero));
        }
        let partial = b.call(callee_fn, &vals[..6], JitType::I64, &i64x6, false);
        let total = b.add(partial, vals[6]);
        b.ret(total, JitType::I64);
        b.finalize_function();
    }
    (caller, callee)
}
