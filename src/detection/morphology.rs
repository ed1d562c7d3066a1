use super::Mask;
use imageproc::distance_transform::Norm;
use imageproc::morphology;

/// Radius of the structuring element. Under the L1 norm a radius of one is
/// the 3x3 cross, which is what a 3x3 ellipse rasterises to.
const KERNEL_RADIUS: u8 = 1;

/// Morphological open (erode then dilate) to drop speckle noise
///
/// Any non-zero pixel counts as foreground; surviving pixels are set to 255.
pub fn open_mask(mask: &Mask) -> Mask {
    let _span = tracing::debug_span!("open_mask").entered();
    morphology::open(mask, Norm::L1, KERNEL_RADIUS)
}
