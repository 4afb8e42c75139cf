#![allow(dead_code)]

use std::io::Write;
use std::sync::{Arc, Mutex};

use subc::lang::Error;
use subc::mach::{compile, Runtime};

/// Shared output sink; a clone goes into the runtime, the original
/// keeps the bytes readable after the run.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn take(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Compile and run, returning the exit status and captured output.
pub fn run(source: &str) -> (i64, String) {
    run_args(source, &[])
}

pub fn run_args(source: &str, args: &[&str]) -> (i64, String) {
    let program = compile(source).unwrap();
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    let mut runtime = Runtime::new(program, &args).unwrap();
    let capture = Capture::default();
    runtime.set_output(Box::new(capture.clone()));
    let status = runtime.run().unwrap();
    (status, capture.take())
}

/// Exit status only, for programs that print nothing.
pub fn status(source: &str) -> i64 {
    run(source).0
}

/// Compile successfully but fail at runtime.
pub fn run_err(source: &str) -> Error {
    let program = compile(source).unwrap();
    let mut runtime = Runtime::new(program, &[]).unwrap();
    runtime.set_output(Box::new(Capture::default()));
    runtime.run().unwrap_err()
}

/// Fail during compilation.
pub fn compile_err(source: &str) -> Error {
    compile(source).unwrap_err()
}
