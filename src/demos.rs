// src/demos.rs
//! Demonstration programs exercising the public surface.
//!
//! Each constructor declares and defines its functions on a caller-supplied
//! module; the caller links and invokes. These are the scenarios the library
//! grew up against: an imported variadic call, inter-function recursion with
//! a near call, and a branch-heavy doubly recursive function.

use crate::jit::{JitType, Marker, Module};

const HELLO: &std::ffi::CStr = c"Hello World\n";
const RESULT_FMT: &std::ffi::CStr = c"result is %ld\n";

/// `main()` printing `Hello World` through an imported `printf`.
pub fn build_hello(module: &mut Module) -> Marker {
    let printf = module.declare_function();
    module.import_function(printf, libc::printf as usize as *const u8);
    let main = module.declare_function();

    let mut b = module.new_function(main, &[]);
    let printf_fn = b.immediate_function(printf);
    let text = b.immediate_int64(HELLO.as_ptr() as i64);
    let print_ret = b.call(printf_fn, &[text], JitType::Void, &[JitType::I64], true);
    b.discard(&[print_ret]);
    let void = b.immediate_void();
    b.ret(void, JitType::Void);
    b.finalize_function();
    main
}

/// `main()` computing the recursive sum `f(n) = 1 if n == 1 else n + f(n-1)`
/// and printing the result through `printf`. Returns the markers of `main`
/// and of the recursive function.
pub fn build_factorial(module: &mut Module, n: i64) -> (Marker, Marker) {
    let printf = module.declare_function();
    module.import_function(printf, libc::printf as usize as *const u8);
    let main = module.declare_function();
    let fact = module.declare_function();

    {
        let mut b = module.new_function(main, &[]);
        let fact_fn = b.immediate_function(fact);
        let arg = b.immediate_int64(n);
        let sum = b.call(fact_fn, &[arg], JitType::I64, &[JitType::I64], false);
        let printf_fn = b.immediate_function(printf);
        let text = b.immediate_int64(RESULT_FMT.as_ptr() as i64);
        let print_ret =
            b.call(printf_fn, &[text, sum], JitType::Void, &[JitType::I64, JitType::I64], true);
        b.discard(&[print_ret]);
        let zero = b.immediate_int64(0);
        b.ret(zero, JitType::I64);
        b.finalize_function();
    }

    {
        let mut b = module.new_function(fact, &[JitType::I64]);
        let entry = b.entry_block();
        let arg = b.arg(0);
        let one = b.immediate_int64(1);
        let base_case = b.label_marker();
        b.branch_if_equal(base_case, arg, one);

        b.begin_bb(entry);
        let pred = b.sub(arg, one);
        let fact_fn = b.immediate_function(fact);
        let rest = b.call(fact_fn, &[pred], JitType::I64, &[JitType::I64], false);
        let sum = b.add(arg, rest);
        b.ret(sum, JitType::I64);

        b.begin_bb(entry);
        b.label(base_case);
        b.ret(one, JitType::I64);
        b.finalize_function();
    }

    (main, fact)
}

/// The Ackermann function `ack(m, n)` as a doubly recursive JIT function.
pub fn build_ackermann(module: &mut Module) -> Marker {
    let ack = module.declare_function();
    let types = [JitType::I64, JitType::I64];

    let mut b = module.new_function(ack, &types);
    let blk0 = b.entry_block();
    let m = b.arg(0);
    let n = b.arg(1);
    let zero = b.immediate_int64(0);
    let one = b.immediate_int64(1);
    let m_minus_1 = b.sub(m, one);
    let ack_fn = b.immediate_function(ack);

    // if m == 0 goto m_zero
    let m_zero = b.label_marker();
    b.branch_if_equal(m_zero, m, zero);
    // if n == 0 goto n_zero
    let blk1 = b.begin_bb(blk0);
    let n_zero = b.label_marker();
    b.branch_if_equal(n_zero, n, zero);
    // ack(m - 1, ack(m, n - 1))
    b.begin_bb(blk1);
    let n_minus_1 = b.sub(n, one);
    let inner = b.call(ack_fn, &[m, n_minus_1], JitType::I64, &types, false);
    let outer = b.call(ack_fn, &[m_minus_1, inner], JitType::I64, &types, false);
    b.ret(outer, JitType::I64);
    // m_zero: n + 1
    b.begin_bb(blk0);
    b.label(m_zero);
    let n_plus_1 = b.add(n, one);
    b.ret(n_plus_1, JitType::I64);
    // n_zero: ack(m - 1, 1)
    b.begin_bb(blk1);
    b.label(n_zero);
    let shallow = b.call(ack_fn, &[m_minus_1, one], JitType::I64, &types, false);
    b.ret(shallow, JitType::I64);

    b.finalize_function();
    ack
}

/// Reference implementation the JIT result is checked against.
#[must_use]
pub fn ackermann_native(m: i64, n: i64) -> i64 {
    if m == 0 {
        n + 1
    } else if n == 0 {
        ackermann_native(m - 1, 1)
    } else {
        ackermann_native(m - 1, ackermann_native(m, n - 1))
    }
}
