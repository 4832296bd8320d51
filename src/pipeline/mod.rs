//! Pipeline stages for PDF-to-PPTX conversion.
//!
//! Each submodule implements one transformation step, so each is testable
//! on its own and the orchestrator can swap implementations (a different
//! rasterizer, a remote remover) without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ watermark / remote ──▶ assemble
//! (bytes)   (pdfium)    (per-page cleanup)     (.pptx)
//!              └──── encode (JPEG) ────┘
//! ```
//!
//! 1. [`input`]     read the user-supplied path into memory
//! 2. [`render`]    rasterize every page; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`watermark`] erase the bottom-right mark with the local smear
//! 4. [`remote`]    or have an image-editing model repaint it; the only
//!    stage with network I/O
//! 5. [`assemble`]  one full-slide picture per page, packaged as OOXML
//!
//! [`encode`] holds the JPEG helpers the other stages share.

pub mod assemble;
pub mod encode;
pub mod input;
pub mod remote;
pub mod render;
pub mod watermark;
