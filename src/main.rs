use clap::Parser;
use console::style;
use minijit::cli::{Args, Demo};
use minijit::demos;
use minijit::error::JitError;
use minijit::jit::{Module, Target};
use minijit::time::Timer;

fn main() -> Result<(), JitError> {
    let args = Args::parse();
    match args.demo {
        Demo::Hello => run_hello(&args),
        Demo::Factorial => run_factorial(&args),
        Demo::Ackermann => run_ackermann(&args),
    }
}

fn run_hello(args: &Args) -> Result<(), JitError> {
    let mut module = Module::new(Target::X86_64SysV);
    let main = demos::build_hello(&mut module);
    module.link()?;
    if args.dump {
        module.debug_dump(main);
    }
    let entry: unsafe extern "C" fn() = unsafe { module.funcptr(main) };
    unsafe { entry() };
    Ok(())
}

fn run_factorial(args: &Args) -> Result<(), JitError> {
    let n = args.n.unwrap_or(10);
    let mut module = Module::new(Target::X86_64SysV);
    let (main, fact) = demos::build_factorial(&mut module, n);
    module.link()?;
    if args.dump {
        module.debug_dump(fact);
        module.debug_dump(main);
    }
    let entry: unsafe extern "C" fn() -> i64 = unsafe { module.funcptr(main) };
    unsafe { entry() };
    Ok(())
}

fn run_ackermann(args: &Args) -> Result<(), JitError> {
    let (m, n) = (args.m, args.n.unwrap_or(6));

    let timer = Timer::new("ack_native");
    let native = demos::ackermann_native(m, n);
    println!(
        "{}({m}, {n}) = {} in {}ms",
        style(timer.title()).cyan(),
        style(native).green(),
        timer.elapsed_millis()
    );

    let timer = Timer::new("ack_jit");
    let mut module = Module::new(Target::X86_64SysV);
    let ack = demos::build_ackermann(&mut module);
    module.link()?;
    if args.dump {
        module.debug_dump(ack);
    }
    let entry: unsafe extern "C" fn(i64, i64) -> i64 = unsafe { module.funcptr(ack) };
    let jitted = unsafe { entry(m, n) };
    println!(
        "{}({m}, {n}) = {} in {}ms",
        style(timer.title()).cyan(),
        style(jitted).green(),
        timer.elapsed_millis()
    );

    if native != jitted {
        eprintln!(
            "{} JIT result {jitted} disagrees with native result {native}",
            style("ERROR:").red().bold()
        );
        std::process::exit(1);
    }
    Ok(())
}
