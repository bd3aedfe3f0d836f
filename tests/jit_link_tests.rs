use minijit::demos;
use minijit::jit::{JitType, Module, RelocKind, Target};

fn new_module() -> Module {
    Module::new(Target::X86_64SysV)
}

#[test]
fn test_every_relocation_is_patched_with_the_linked_address() {
    let mut module = new_module();
    let (main, fact) = demos::build_factorial(&mut module, 10);
    module.link().unwrap();

    let base = module.code_base() as usize;
    let code = module.linked_code();
    let mut near_seen = 0;
    let mut far_seen = 0;
    for marker in [main, fact] {
        let start = module.function_offset(marker);
        for reloc in module.function_relocations(marker) {
            let site = start + reloc.offset;
            let target = module.get_funcptr(reloc.marker) as usize;
            match reloc.kind {
                RelocKind::CallRel32 => {
                    let patched = i32::from_le_bytes(code[site..site + 4].try_into().unwrap());
                    let expected = target as i64 - (base + site) as i64 - 4;
                    assert_eq!(i64::from(patched), expected);
                    near_seen += 1;
                }
                RelocKind::Abs64 => {
                    let patched = u64::from_le_bytes(code[site..site + 8].try_into().unwrap());
                    assert_eq!(patched, target as u64);
                    far_seen += 1;
                }
            }
        }
    }
    // main calls fact near and printf far; fact calls itself near
    assert!(near_seen >= 2, "expected near call relocations, saw {near_seen}");
    assert!(far_seen >= 1, "expected a far import relocation, saw {far_seen}");
}

#[test]
fn test_functions_are_laid_out_in_creation_order() {
    let mut module = new_module();
    let (main, fact) = demos::build_factorial(&mut module, 10);
    module.link().unwrap();

    assert_eq!(module.function_offset(main), 0);
    assert_eq!(module.function_offset(fact), module.function_bytes(main).len());
    let total = module.function_bytes(main).len() + module.function_bytes(fact).len();
    assert_eq!(module.linked_code().len(), total);
}

#[test]
fn test_linked_output_is_deterministic_for_identical_modules() {
    let mut first = new_module();
    let ack_a = demos::build_ackermann(&mut first);
    first.link().unwrap();
    let mut second = new_module();
    let ack_b = demos::build_ackermann(&mut second);
    second.link().unwrap();

    assert_eq!(first.function_bytes(ack_a), second.function_bytes(ack_b));
    // no absolute addresses are embedded here, so even the patched bytes match
    assert_eq!(first.linked_code(), second.linked_code());
}

#[test]
fn test_entry_pointers_cover_imports_and_definitions() {
    let mut module = new_module();
    let printf = module.declare_function();
    module.import_function(printf, libc::printf as usize as *const u8);
    let f = module.declare_function();
    let mut b = module.new_function(f, &[]);
    let void = b.immediate_void();
    b.ret(void, JitType::Void);
    b.finalize_function();
    module.link().unwrap();

    assert_eq!(module.get_funcptr(printf) as usize, libc::printf as usize);
    let entry = module.get_funcptr(f) as usize;
    let base = module.code_base() as usize;
    assert_eq!(entry, base);
}

#[test]
#[should_panic(expected = "never defined or imported")]
fn test_dangling_marker_at_link_is_fatal() {
    let mut module = new_module();
    let ghost = module.declare_function();
    let f = module.declare_function();
    let mut b = module.new_function(f, &[]);
    let ghost_fn = b.immediate_function(ghost);
    let result = b.call(ghost_fn, &[], JitType::I64, &[], false);
    b.ret(result, JitType::I64);
    b.finalize_function();
    let _ = module.link();
}

#[test]
#[should_panic(expected = "already linked")]
fn test_linking_twice_is_fatal() {
    let mut module = new_module();
    let f = module.declare_function();
    let mut b = module.new_function(f, &[]);
    let void = b.immediate_void();
    b.ret(void, JitType::Void);
    b.finalize_function();
    module.link().unwrap();
    let _ = module.link();
}

#[test]
#[should_panic(expected = "module is not linked")]
fn test_funcptr_before_link_is_fatal() {
    let mut module = new_module();
    let f = module.declare_function();
    let mut b = module.new_function(f, &[]);
    let void = b.immediate_void();
    b.ret(void, JitType::Void);
    b.finalize_function();
    module.get_funcptr(f);
}

#[test]
#[should_panic(expected = "already bound")]
fn test_importing_over_a_binding_is_fatal() {
    let mut module = new_module();
    let printf = module.declare_function();
    module.import_function(printf, libc::printf as usize as *const u8);
    module.import_function(printf, libc::printf as usize as *const u8);
}

#[test]
#[should_panic(expected = "bound to a host import")]
fn test_defining_an_import_is_fatal() {
    let mut module = new_module();
    let printf = module.declare_function();
    module.import_function(printf, libc::printf as usize as *const u8);
    module.new_function(printf, &[]);
}
