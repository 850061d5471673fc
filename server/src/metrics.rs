use image::RgbImage;
use ndarray::Array2;
use shared::OpencvMetrics;

/// ITU-R BT.601 luma plane, kept in floating point so the downstream
/// statistics match OpenCV's CV_64F behavior.
pub fn grayscale(image: &RgbImage) -> Array2<f64> {
    let (width, height) = image.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
        let p = image.get_pixel(x as u32, y as u32);
        0.299 * p.0[0] as f64 + 0.587 * p.0[1] as f64 + 0.114 * p.0[2] as f64
    })
}

/// Computes all five classical quality metrics from the decoded image.
/// Pure function of the pixel data; identical input yields identical output.
pub fn compute(image: &RgbImage) -> OpencvMetrics {
    let gray = grayscale(image);
    OpencvMetrics {
        sharpness_laplacian: laplacian_variance(&gray),
        contrast_std: gray.std(0.0),
        brightness: gray.mean().unwrap_or(0.0),
        noise_variance: noise_variance(&gray),
        blockiness: blockiness(&gray),
    }
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64
}

/// Variance of the 3x3 Laplacian response over interior pixels. Higher means
/// sharper edges.
fn laplacian_variance(gray: &Array2<f64>) -> f64 {
    let (height, width) = gray.dim();
    if height < 3 || width < 3 {
        return 0.0;
    }
    let mut response = Vec::with_capacity((height - 2) * (width - 2));
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let laplacian = gray[[y - 1, x]] + gray[[y + 1, x]] + gray[[y, x - 1]]
                + gray[[y, x + 1]]
                - 4.0 * gray[[y, x]];
            response.push(laplacian);
        }
    }
    variance(&response)
}

/// Variance of the residual after a mild 3x3 Gaussian blur, approximating
/// high-frequency noise energy.
fn noise_variance(gray: &Array2<f64>) -> f64 {
    const KERNEL: [[f64; 3]; 3] = [[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]];
    let (height, width) = gray.dim();
    if height < 3 || width < 3 {
        return 0.0;
    }
    let mut residual = Vec::with_capacity((height - 2) * (width - 2));
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut acc = 0.0;
            for (ky, row) in KERNEL.iter().enumerate() {
                for (kx, weight) in row.iter().enumerate() {
                    acc += weight * gray[[y + ky - 1, x + kx - 1]];
                }
            }
            residual.push(gray[[y, x]] - acc / 16.0);
        }
    }
    variance(&residual)
}

/// Summed absolute neighbor differences, horizontal and vertical, normalized
/// by total pixel count. Strong block-compression artifacts push this up.
fn blockiness(gray: &Array2<f64>) -> f64 {
    let (height, width) = gray.dim();
    if height == 0 || width == 0 {
        return 0.0;
    }
    let mut total = 0.0;
    for y in 0..height {
        for x in 0..width.saturating_sub(1) {
            total += (gray[[y, x + 1]] - gray[[y, x]]).abs();
        }
    }
    for y in 0..height.saturating_sub(1) {
        for x in 0..width {
            total += (gray[[y + 1, x]] - gray[[y, x]]).abs();
        }
    }
    total / (height * width) as f64
}
