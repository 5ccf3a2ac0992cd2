use ndarray::ArrayView3;

use crate::shared::dimensions::Dimensions;

/// One decoded video frame: contiguous RGB bytes in row-major order.
///
/// Pixel format conversion happens in the reader; everything downstream
/// treats the data as packed RGB24.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

impl Frame {
    pub const CHANNELS: usize = 3;

    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * Self::CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// Solid-colour frame, used for placeholders and tests.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], index: usize) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * Self::CHANNELS)
            .collect();
        Self::new(data, width, height, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Position of this frame in decode order, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, Self::CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Scales to `target` with bilinear filtering, keeping the index.
    pub fn resized(&self, target: Dimensions) -> Frame {
        if target == self.dimensions() {
            return self.clone();
        }
        let Some(img) = image::RgbImage::from_raw(self.width, self.height, self.data.clone()) else {
            return Frame::filled(target.width, target.height, [0, 0, 0], self.index);
        };
        let scaled = image::imageops::resize(
            &img,
            target.width,
            target.height,
            image::imageops::FilterType::Triangle,
        );
        Frame::new(scaled.into_raw(), target.width, target.height, self.index)
    }

    /// Turns the picture clockwise by a quarter-turn multiple, keeping the
    /// index. Other angles return the frame unchanged.
    pub fn rotated(self, degrees: i32) -> Frame {
        if !matches!(degrees, 90 | 180 | 270) {
            return self;
        }
        let (index, width, height) = (self.index, self.width, self.height);
        let Some(img) = image::RgbImage::from_raw(width, height, self.data) else {
            return Frame::filled(width, height, [0, 0, 0], index).rotated(degrees);
        };
        let turned = match degrees {
            90 => image::imageops::rotate90(&img),
            180 => image::imageops::rotate180(&img),
            _ => image::imageops::rotate270(&img),
        };
        let (width, height) = turned.dimensions();
        Frame::new(turned.into_raw(), width, height, index)
    }

    /// Expands to RGBA with an opaque alpha channel (what GUI image widgets take).
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.data.len() / Self::CHANNELS * 4);
        for px in self.data.chunks_exact(Self::CHANNELS) {
            rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
        rgba
    }
}
