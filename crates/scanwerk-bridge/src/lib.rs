// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanwerk: camera bridge abstractions.
//
// Defines the seam a platform camera (or any other producer of frames)
// implements to feed the detection pipeline.

pub mod traits;

pub use traits::FrameSource;
