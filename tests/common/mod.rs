//! Common test utilities shared by the integration tests.
//!
//! Not every test binary uses every helper.
#![allow(dead_code)]

/// Synthetic pictures and their encodings
pub mod test_images {
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    /// Horizontal gradient, so resized output is not uniform
    pub fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            let r = (x * 255 / w.max(1)) as u8;
            let g = (y * 255 / h.max(1)) as u8;
            Rgba([r, g, 128, 255])
        })
    }

    pub fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png)
            .expect("PNG encoding of a test image");
        out.into_inner()
    }

    pub fn jpeg_bytes(w: u32, h: u32) -> Vec<u8> {
        let rgb = image::DynamicImage::ImageRgba8(gradient(w, h)).to_rgb8();
        let mut out = Cursor::new(Vec::new());
        rgb.write_to(&mut out, ImageFormat::Jpeg)
            .expect("JPEG encoding of a test image");
        out.into_inner()
    }

    /// Writes `samples/<name>` under `root`.
    pub fn write_sample(root: &std::path::Path, name: &str, w: u32, h: u32) {
        let dir = root.join("samples");
        std::fs::create_dir_all(&dir).expect("create samples dir");
        std::fs::write(dir.join(name), jpeg_bytes(w, h)).expect("write sample");
    }
}

/// Fake model backends
pub mod fake_backends {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use pixel_guess::inference::{CaptionAnswer, CaptionBackend, CaptionRequest};
    use tokio::time::Instant;

    /// Fails the first `failures` calls, then answers with the image size.
    /// Records when each call happened.
    pub struct ScriptedBackend {
        failures: u32,
        empty_answers: bool,
        calls: AtomicU32,
        call_times: Mutex<Vec<Instant>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        pub fn succeeding() -> Self {
            Self::failing(0)
        }

        pub fn failing(failures: u32) -> Self {
            Self {
                failures,
                empty_answers: false,
                calls: AtomicU32::new(0),
                call_times: Mutex::new(Vec::new()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn always_failing() -> Self {
            Self::failing(u32::MAX)
        }

        /// Succeeds at the transport level but returns no candidates.
        pub fn empty() -> Self {
            Self {
                empty_answers: true,
                ..Self::failing(0)
            }
        }

        pub fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn call_times(&self) -> Vec<Instant> {
            self.call_times.lock().unwrap().clone()
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CaptionBackend for ScriptedBackend {
        async fn generate(&self, request: &CaptionRequest<'_>) -> anyhow::Result<Vec<CaptionAnswer>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.call_times.lock().unwrap().push(Instant::now());
            self.prompts.lock().unwrap().push(request.prompt.to_string());

            if n <= self.failures {
                anyhow::bail!("Request contains an invalid argument (call {n})");
            }
            if self.empty_answers {
                return Ok(Vec::new());
            }
            let img = image::load_from_memory(request.image)?;
            Ok(vec![
                CaptionAnswer::Text(format!("a {}x{} picture", img.width(), img.height())),
                CaptionAnswer::Text("second opinion".to_string()),
            ])
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }
}
