use kspace_transforms::{
    build_mri_transforms, default_operators, Key, MaskFunc, MriTransformsConfig,
    Result as TransformResult, Sample, SampleSeed, Value,
};
use ndarray::{ArrayD, IxDyn};
use num_complex::Complex32;
use rand::Rng;
use std::error::Error;
use std::sync::Arc;

/// Random 1D column mask with a fully sampled center, seeded per file.
fn random_columns(shape: &[usize], seed: Option<&SampleSeed>, return_acs: bool) -> TransformResult<ArrayD<bool>> {
    let (h, w) = (shape[0], shape[1]);
    let acs = (w / 12).max(1);
    let center = (w - acs) / 2..(w + acs) / 2;
    let mut rng = match seed {
        Some(seed) => seed.rng(),
        None => SampleSeed::from_filename("unseeded").rng(),
    };
    let columns: Vec<bool> = (0..w)
        .map(|x| center.contains(&x) || (!return_acs && rng.gen_bool(0.25)))
        .collect();
    Ok(ArrayD::from_shape_fn(IxDyn(&[1, h, w, 1]), |i| columns[i[2]]))
}

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    let config = match args.get(1) {
        Some(path) => MriTransformsConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => MriTransformsConfig::default(),
    };

    let (forward, backward) = default_operators();
    let mask_func: Arc<dyn MaskFunc> = Arc::new(random_columns);
    let pipeline = build_mri_transforms(forward, backward, Some(mask_func), &config)?;
    println!("{}", pipeline);

    // Smooth synthetic object seen by 8 coils with linear phase ramps.
    let (coils, h, w) = (8, 128, 128);
    let kspace = ArrayD::from_shape_fn(IxDyn(&[coils, h, w]), |i| {
        let (c, y, x) = (i[0] as f32, i[1] as f32 - h as f32 / 2.0, i[2] as f32 - w as f32 / 2.0);
        let envelope = (-(x * x + y * y) / 200.0).exp();
        Complex32::from_polar(envelope * (1.0 + c), 0.1 * c * x)
    });

    let sample = Sample::new("synthetic_001.h5").with(Key::Kspace, Value::RawComplex(kspace));
    let out = pipeline.apply(sample)?;

    for key in out.keys() {
        match out.get(key) {
            Some(Value::Scalar(v)) => println!("{:>18}: {}", key, v),
            Some(value) => println!("{:>18}: {} {:?}", key, value.kind(), value.shape()),
            None => {}
        }
    }
    Ok(())
}
