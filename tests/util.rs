//! Shared test utilities for integration tests
//!
//! Provides a small texture library fixture used across multiple test files.

#![allow(dead_code)]

use assert_fs::prelude::*;

/// Texture library with three material folders and some noise:
///
/// ```text
/// Metal/notes.txt
/// Metal/Rusty/Plate/{plate_col,plate_ao,plate_metal}.png
/// Wood/Oak/{Oak_Albedo,Oak_Roughness,Oak_Normal}.png
/// Wood/Pine/{pine_diff.jpg,pine_diff.png,pine_disp.png,pine_bump.png}
/// ```
pub fn make_texture_library() -> assert_fs::TempDir
{
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    let files = [
        ("Metal/notes.txt", 5),
        ("Metal/Rusty/Plate/plate_col.png", 40),
        ("Metal/Rusty/Plate/plate_ao.png", 20),
        ("Metal/Rusty/Plate/plate_metal.png", 20),
        ("Wood/Oak/Oak_Albedo.png", 64),
        ("Wood/Oak/Oak_Roughness.png", 32),
        ("Wood/Oak/Oak_Normal.png", 32),
        ("Wood/Pine/pine_diff.jpg", 16),
        ("Wood/Pine/pine_diff.png", 48),
        ("Wood/Pine/pine_disp.png", 8),
        ("Wood/Pine/pine_bump.png", 8),
    ];
    for (rel, size) in files
    {
        tmp.child(rel)
            .write_binary(&vec![0u8; size])
            .expect("write");
    }

    tmp
}

/// Empty directory to hold the catalog ledger.
pub fn make_library_dir() -> assert_fs::TempDir
{
    assert_fs::TempDir::new().expect("tempdir")
}
