use image::{Rgb, RgbImage};

fn main() -> anyhow::Result<()> {
    // Pale skin: too light to pass as lip, too saturated to pass as tooth
    let mut img = RgbImage::from_pixel(400, 240, Rgb([240, 220, 210]));

    // Lips
    for y in 60..180 {
        for x in 80..320 {
            img.put_pixel(x, y, Rgb([170, 50, 70]));
        }
    }

    // Dark mouth opening with two rows of teeth, 1 px apart
    for y in 84..156 {
        for x in 104..296 {
            img.put_pixel(x, y, Rgb([15, 10, 10]));
        }
    }
    for top in [88, 122] {
        for i in 0..8 {
            let x0 = 116 + i * 21;
            for y in top..top + 30 {
                for x in x0..x0 + 20 {
                    img.put_pixel(x, y, Rgb([240, 238, 230]));
                }
            }
        }
    }

    img.save("test_smile.png")?;
    println!("Created test_smile.png (400x240, 16 teeth)");
    Ok(())
}
