use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_hello_demo_prints_hello_world() {
    Command::cargo_bin("minijit")
        .unwrap()
        .args(["--demo", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello World"));
}

#[test]
fn test_factorial_demo_prints_the_recursive_sum() {
    Command::cargo_bin("minijit")
        .unwrap()
        .args(["--demo", "factorial", "-n", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("result is 15"));
}

#[test]
fn test_ackermann_demo_reports_native_and_jit_results() {
    Command::cargo_bin("minijit")
        .unwrap()
        .args(["--demo", "ackermann", "-m", "2", "-n", "3"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("ack_native(2, 3) = 9")
                .and(predicate::str::contains("ack_jit(2, 3) = 9")),
        );
}

#[test]
fn test_dump_flag_hex_dumps_the_generated_code() {
    Command::cargo_bin("minijit")
        .unwrap()
        .args(["--demo", "ackermann", "-m", "1", "-n", "1", "--dump"])
        .assert()
        .success()
        .stdout(predicate::str::contains("generated code:"));
}

#[test]
fn test_unknown_demo_is_rejected() {
    Command::cargo_bin("minijit")
        .unwrap()
        .args(["--demo", "fibonacci"])
        .assert()
        .failure();
}
