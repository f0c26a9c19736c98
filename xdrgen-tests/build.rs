use std::env;
use std::path::{Path, PathBuf};

use xdrgen::codegen::Options;
use xdrgen::{Driver, Status};

const SCHEMAS: &[&str] = &["basic", "calc"];

fn main() {
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").unwrap());

    for name in SCHEMAS {
        let input = format!("schemas/{name}.x");
        println!("cargo:rerun-if-changed={input}");

        let mut driver = Driver::new();
        driver.set_options(Options {
            module: Some(name.to_string()),
            ..Options::default()
        });
        let file_id = driver.load_source_path(Path::new(&input)).unwrap();
        let status = driver.compile_and_write(file_id, &out_dir.join(format!("{name}.rs")));
        assert_eq!(status, Status::Ok, "failed to compile `{input}`");
    }
}
