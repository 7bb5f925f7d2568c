//! Build script for array-device.
//!
//! The CPU-only build needs no build-time work. With the `cuda` feature,
//! device enumeration links against the CUDA driver through cudarc, which
//! expects the toolkit to be installed on the build host.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    #[cfg(feature = "cuda")]
    {
        println!("cargo:warning=CUDA feature enabled — ensure CUDA toolkit is installed");
    }
}
