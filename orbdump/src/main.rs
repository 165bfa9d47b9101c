use log::*;
use orb_node::{Component, NodeSettings, OrbNode};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "orbdump",
    about = "A tool to dump ORB keypoints and descriptors of images"
)]
struct Opt {
    /// The maximum number of features per image.
    ///
    /// Overrides the value from the settings file.
    #[structopt(short, long)]
    nfeatures: Option<usize>,
    /// A JSON file with node settings. Missing fields take their defaults.
    #[structopt(short, long, parse(from_os_str))]
    settings: Option<PathBuf>,
    /// Also write `<stem>_kps.png` with the keypoints drawn on the image.
    #[structopt(short, long)]
    draw: bool,
    /// The directory the output files are written to.
    #[structopt(short, long, default_value = ".", parse(from_os_str))]
    output: PathBuf,
    /// The image files to extract features from.
    #[structopt(parse(from_os_str))]
    images: Vec<PathBuf>,
}

fn main() {
    pretty_env_logger::init_timed();
    let opt = Opt::from_args();
    let mut settings: NodeSettings = opt
        .settings
        .as_ref()
        .map(|path| {
            let file = File::open(path).expect("failed to open settings file");
            serde_json::from_reader(file).expect("failed to parse settings file")
        })
        .unwrap_or_default();
    if let Some(nfeatures) = opt.nfeatures {
        settings.nfeatures = nfeatures;
    }
    info!("Using {:?}", settings);

    let mut node = OrbNode::new(settings);
    if !(node.on_init() && node.on_start()) {
        error!("node failed to start");
        return;
    }
    for path in &opt.images {
        let image = image::open(path).expect("failed to open image file");
        if !node.on_activate(&image) {
            warn!("skipping {}", path.display());
            continue;
        }
        let features = node.latest().expect("an activation published features");
        info!("{}: {} features", path.display(), features.len());
        let kp_file = File::create(orbdump::output_path(&opt.output, path, "_kps.csv"))
            .expect("failed to create keypoint file");
        let desc_file = File::create(orbdump::output_path(&opt.output, path, "_descs.txt"))
            .expect("failed to create descriptor file");
        orbdump::write_features(&features, BufWriter::new(kp_file), BufWriter::new(desc_file))
            .expect("failed to write features");
        if opt.draw {
            orbdump::render_keypoints(&image, &features.keypoints)
                .save(orbdump::output_path(&opt.output, path, "_kps.png"))
                .expect("failed to write keypoint image");
        }
    }
    node.on_stop();
    node.on_finish();
}
