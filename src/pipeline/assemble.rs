//! Presentation assembly: one full-bleed picture slide per page.
//!
//! [`PptxAssembler`] writes the smallest Office Open XML package PowerPoint,
//! Keynote and LibreOffice all open: one master, one blank layout, one theme,
//! and a slide per page holding a single picture. Page buffers are embedded
//! as-is (stored, not deflated; JPEG does not compress further).
//!
//! ```text
//! [Content_Types].xml
//! _rels/.rels
//! docProps/{core,app}.xml
//! ppt/presentation.xml            ppt/_rels/presentation.xml.rels
//! ppt/slideMasters/slideMaster1.xml (+ rels)
//! ppt/slideLayouts/slideLayout1.xml (+ rels)
//! ppt/theme/theme1.xml
//! ppt/slides/slide{N}.xml           (+ rels → ../media/image{N}.jpg)
//! ppt/media/image{N}.jpg
//! ```

use crate::config::{ConversionConfig, SlideLayout};
use crate::error::Pdf2PptxError;
use crate::output::{Artifact, PageImage, ProcessedPage};
use std::fmt::Write as _;
use std::io::{Cursor, Write};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Builds the output file from the processed pages.
pub trait PresentationAssembler: Send + Sync {
    /// Emit one slide per page, in index order.
    ///
    /// Uses `cleaned` for successful pages and `original` otherwise.
    /// Zero pages is an error.
    fn assemble(&self, pages: &[ProcessedPage]) -> Result<Artifact, Pdf2PptxError>;
}

/// [`PresentationAssembler`] producing a `.pptx` file.
#[derive(Debug, Clone)]
pub struct PptxAssembler {
    layout: SlideLayout,
    file_name: String,
    title: Option<String>,
}

impl PptxAssembler {
    pub fn new(layout: SlideLayout, file_name: impl Into<String>) -> Self {
        Self {
            layout,
            file_name: file_name.into(),
            title: None,
        }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(config.slide_layout, config.output_file_name.clone())
    }

    /// Title written to the package's core properties.
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }
}

impl PresentationAssembler for PptxAssembler {
    fn assemble(&self, pages: &[ProcessedPage]) -> Result<Artifact, Pdf2PptxError> {
        if pages.is_empty() {
            return Err(Pdf2PptxError::EmptyPresentation);
        }

        let mut ordered: Vec<&ProcessedPage> = pages.iter().collect();
        ordered.sort_by_key(|p| p.index);
        let images: Vec<&PageImage> = ordered.iter().map(|p| p.slide_image()).collect();

        let bytes = write_package(&images, self.layout, self.title.as_deref())
            .map_err(|e| Pdf2PptxError::AssemblyFailed(e.to_string()))?;

        info!(
            "Assembled {} slides into {} ({} bytes)",
            images.len(),
            self.file_name,
            bytes.len()
        );
        Ok(Artifact {
            file_name: self.file_name.clone(),
            bytes,
        })
    }
}

/// Placement of a picture on the slide canvas, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u64,
    pub y: u64,
    pub cx: u64,
    pub cy: u64,
}

/// Largest rectangle with the image's aspect ratio that fits the canvas,
/// centred.
pub fn fit_contain(img_w: u32, img_h: u32, canvas_w: u64, canvas_h: u64) -> Placement {
    if img_w == 0 || img_h == 0 {
        return Placement {
            x: 0,
            y: 0,
            cx: canvas_w,
            cy: canvas_h,
        };
    }
    let (iw, ih) = (u128::from(img_w), u128::from(img_h));
    let (cw, ch) = (u128::from(canvas_w), u128::from(canvas_h));

    let (cx, cy) = if iw * ch >= cw * ih {
        (cw, ih * cw / iw)
    } else {
        (iw * ch / ih, ch)
    };
    Placement {
        x: ((cw - cx) / 2) as u64,
        y: ((ch - cy) / 2) as u64,
        cx: cx as u64,
        cy: cy as u64,
    }
}

fn write_package(
    images: &[&PageImage],
    layout: SlideLayout,
    title: Option<&str>,
) -> Result<Vec<u8>, std::io::Error> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let xml = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    fn put(
        zip: &mut ZipWriter<Cursor<Vec<u8>>>,
        name: &str,
        body: &[u8],
        options: SimpleFileOptions,
    ) -> Result<(), std::io::Error> {
        zip.start_file(name, options)?;
        zip.write_all(body)
    }

    put(&mut zip, "[Content_Types].xml", content_types(images).as_bytes(), xml)?;
    put(&mut zip, "_rels/.rels", package_rels().as_bytes(), xml)?;
    put(&mut zip, "docProps/core.xml", core_props(title).as_bytes(), xml)?;
    put(&mut zip, "docProps/app.xml", app_props(images.len()).as_bytes(), xml)?;
    put(&mut zip, "ppt/presentation.xml", presentation(images.len(), layout).as_bytes(), xml)?;
    put(
        &mut zip,
        "ppt/_rels/presentation.xml.rels",
        presentation_rels(images.len()).as_bytes(),
        xml,
    )?;
    put(&mut zip, "ppt/slideMasters/slideMaster1.xml", SLIDE_MASTER.as_bytes(), xml)?;
    put(
        &mut zip,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        rels(&[
            ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
            ("rId2", "theme", "../theme/theme1.xml"),
        ])
        .as_bytes(),
        xml,
    )?;
    put(&mut zip, "ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT.as_bytes(), xml)?;
    put(
        &mut zip,
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        rels(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]).as_bytes(),
        xml,
    )?;
    put(&mut zip, "ppt/theme/theme1.xml", THEME.as_bytes(), xml)?;

    let (canvas_w, canvas_h) = layout.size_emu();
    for (i, image) in images.iter().enumerate() {
        let n = i + 1;
        let media = format!("image{n}.{}", image.extension());
        let placement = fit_contain(image.width(), image.height(), canvas_w, canvas_h);
        debug!(slide = n, ?placement, "Placing page image");

        put(
            &mut zip,
            &format!("ppt/slides/slide{n}.xml"),
            slide(n, placement).as_bytes(),
            xml,
        )?;
        put(
            &mut zip,
            &format!("ppt/slides/_rels/slide{n}.xml.rels"),
            rels(&[
                ("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
                ("rId2", "image", &format!("../media/{media}")),
            ])
            .as_bytes(),
            xml,
        )?;
        put(&mut zip, &format!("ppt/media/{media}"), image.data(), stored)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

// ── Part builders ────────────────────────────────────────────────────────

fn content_types(images: &[&PageImage]) -> String {
    let mut s = format!(
        r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>"#
    );
    let mut seen: Vec<&str> = Vec::new();
    for image in images {
        let ext = image.extension();
        if !seen.contains(&ext) {
            seen.push(ext);
            let _ = write!(
                s,
                r#"<Default Extension="{ext}" ContentType="{}"/>"#,
                image.mime_type()
            );
        }
    }
    let pml = "application/vnd.openxmlformats-officedocument.presentationml";
    let _ = write!(
        s,
        r#"<Override PartName="/ppt/presentation.xml" ContentType="{pml}.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="{pml}.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="{pml}.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#
    );
    for n in 1..=images.len() {
        let _ = write!(
            s,
            r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="{pml}.slide+xml"/>"#
        );
    }
    s.push_str("</Types>");
    s
}

fn package_rels() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL}/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="{REL}/extended-properties" Target="docProps/app.xml"/></Relationships>"#
    )
}

/// Relationship part from `(id, type suffix, target)` triples.
fn rels(entries: &[(&str, &str, &str)]) -> String {
    let mut s = format!(
        r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#
    );
    for (id, kind, target) in entries {
        let _ = write!(
            s,
            r#"<Relationship Id="{id}" Type="{REL}/{kind}" Target="{target}"/>"#
        );
    }
    s.push_str("</Relationships>");
    s
}

fn core_props(title: Option<&str>) -> String {
    let title = quick_xml::escape::escape(title.unwrap_or("Cleaned Presentation"));
    format!(
        r#"{XML_DECL}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{title}</dc:title><dc:creator>edgequake-pdf2pptx</dc:creator><cp:revision>1</cp:revision></cp:coreProperties>"#
    )
}

fn app_props(slides: usize) -> String {
    format!(
        r#"{XML_DECL}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>edgequake-pdf2pptx</Application><Slides>{slides}</Slides></Properties>"#
    )
}

fn presentation(slides: usize, layout: SlideLayout) -> String {
    let (cx, cy) = layout.size_emu();
    let mut ids = String::new();
    for i in 0..slides {
        // rId1 = master, rId2 = theme, slides follow.
        let _ = write!(ids, r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, 3 + i);
    }
    format!(
        r#"{XML_DECL}<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{ids}</p:sldIdLst><p:sldSz cx="{cx}" cy="{cy}" type="{}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
        layout.ooxml_type()
    )
}

fn presentation_rels(slides: usize) -> String {
    let mut entries: Vec<(String, &str, String)> = vec![
        ("rId1".into(), "slideMaster", "slideMasters/slideMaster1.xml".into()),
        ("rId2".into(), "theme", "theme/theme1.xml".into()),
    ];
    for n in 1..=slides {
        entries.push((format!("rId{}", n + 2), "slide", format!("slides/slide{n}.xml")));
    }
    let borrowed: Vec<(&str, &str, &str)> = entries
        .iter()
        .map(|(id, kind, target)| (id.as_str(), *kind, target.as_str()))
        .collect();
    rels(&borrowed)
}

fn slide(n: usize, at: Placement) -> String {
    format!(
        r#"{XML_DECL}<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:spTree>{GROUP}<p:pic><p:nvPicPr><p:cNvPr id="2" name="Page {n}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
        at.x, at.y, at.cx, at.cy
    )
}

// ── Static parts ─────────────────────────────────────────────────────────

const GROUP: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

const SLIDE_MASTER: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">"#,
    r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>"#,
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
    r#"</p:spTree></p:cSld>"#,
    r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
    r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
    r#"</p:sldMaster>"#
);

const SLIDE_LAYOUT: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="blank" preserve="1">"#,
    r#"<p:cSld name="Blank"><p:spTree>"#,
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
    r#"</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
);

const THEME: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements>"#,
    r#"<a:clrScheme name="Office">"#,
    r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#,
    r#"<a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>"#,
    r#"<a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2>"#,
    r#"<a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4>"#,
    r#"<a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6>"#,
    r#"<a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink>"#,
    r#"</a:clrScheme>"#,
    r#"<a:fontScheme name="Office">"#,
    r#"<a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
    r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
    r#"</a:fontScheme>"#,
    r#"<a:fmtScheme name="Office">"#,
    r#"<a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst>"#,
    r#"<a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst>"#,
    r#"<a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst>"#,
    r#"<a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst>"#,
    r#"</a:fmtScheme>"#,
    r#"</a:themeElements></a:theme>"#
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PageError;
    use crate::pipeline::encode::encode_jpeg;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::io::Read;

    fn jpeg(w: u32, h: u32, shade: u8) -> PageImage {
        let img = RgbImage::from_pixel(w, h, Rgb([shade, shade, shade]));
        encode_jpeg(&DynamicImage::ImageRgb8(img), 90).unwrap()
    }

    fn read_entry(bytes: &[u8], name: &str) -> Vec<u8> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = Vec::new();
        file.read_to_end(&mut out).unwrap();
        out
    }

    fn read_str(bytes: &[u8], name: &str) -> String {
        String::from_utf8(read_entry(bytes, name)).unwrap()
    }

    #[test]
    fn fit_contain_wide_image_letterboxes() {
        // 2:1 picture on a 16:9 canvas fills the width.
        let p = fit_contain(2000, 1000, 9_144_000, 5_143_500);
        assert_eq!(p.cx, 9_144_000);
        assert_eq!(p.cy, 4_572_000);
        assert_eq!(p.x, 0);
        assert_eq!(p.y, (5_143_500 - 4_572_000) / 2);
    }

    #[test]
    fn fit_contain_tall_image_pillarboxes() {
        let p = fit_contain(1000, 1000, 9_144_000, 5_143_500);
        assert_eq!(p.cy, 5_143_500);
        assert_eq!(p.cx, 5_143_500);
        assert_eq!(p.x, (9_144_000 - 5_143_500) / 2);
        assert_eq!(p.y, 0);
    }

    #[test]
    fn fit_contain_exact_ratio_fills_canvas() {
        let p = fit_contain(1920, 1080, 9_144_000, 5_143_500);
        assert_eq!((p.x, p.y, p.cx, p.cy), (0, 0, 9_144_000, 5_143_500));
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = PptxAssembler::new(SlideLayout::default(), "x.pptx")
            .assemble(&[])
            .unwrap_err();
        assert!(matches!(err, Pdf2PptxError::EmptyPresentation));
    }

    #[test]
    fn slides_follow_index_order_and_status() {
        let p0 = ProcessedPage::success(0, jpeg(64, 36, 10), jpeg(64, 36, 20), 1);
        let failed_original = jpeg(64, 36, 30);
        let p1 = ProcessedPage::failed(
            1,
            failed_original.clone(),
            PageError::Cleanup {
                page: 1,
                detail: "x".into(),
            },
            1,
        );
        let p2 = ProcessedPage::success(2, jpeg(64, 36, 40), jpeg(64, 36, 50), 1);
        let cleaned0 = p0.cleaned.clone();
        let cleaned2 = p2.cleaned.clone();

        // Deliberately out of order.
        let artifact = PptxAssembler::new(SlideLayout::Widescreen16x9, "Deck.pptx")
            .assemble(&[p2, p0, p1])
            .unwrap();
        assert_eq!(artifact.file_name, "Deck.pptx");

        let b = &artifact.bytes;
        assert_eq!(read_entry(b, "ppt/media/image1.jpg"), cleaned0.data());
        assert_eq!(read_entry(b, "ppt/media/image2.jpg"), failed_original.data());
        assert_eq!(read_entry(b, "ppt/media/image3.jpg"), cleaned2.data());

        let pres = read_str(b, "ppt/presentation.xml");
        assert_eq!(pres.matches("<p:sldId ").count(), 3);
        assert!(pres.contains(r#"type="screen16x9""#));

        let types = read_str(b, "[Content_Types].xml");
        assert!(types.contains("/ppt/slides/slide3.xml"));
        assert!(types.contains(r#"Extension="jpg""#));

        let rels = read_str(b, "ppt/slides/_rels/slide2.xml.rels");
        assert!(rels.contains("../media/image2.jpg"));
    }

    #[test]
    fn four_by_three_layout_is_recorded() {
        let page = ProcessedPage::success(0, jpeg(40, 30, 1), jpeg(40, 30, 1), 0);
        let artifact = PptxAssembler::new(SlideLayout::Standard4x3, "x.pptx")
            .assemble(&[page])
            .unwrap();
        let pres = read_str(&artifact.bytes, "ppt/presentation.xml");
        assert!(pres.contains(r#"cy="6858000" type="screen4x3""#));
        // 4:3 page on a 4:3 canvas covers it exactly.
        let slide = read_str(&artifact.bytes, "ppt/slides/slide1.xml");
        assert!(slide.contains(r#"<a:off x="0" y="0"/><a:ext cx="9144000" cy="6858000"/>"#));
    }

    #[test]
    fn title_is_escaped() {
        let page = ProcessedPage::success(0, jpeg(8, 8, 1), jpeg(8, 8, 1), 0);
        let artifact = PptxAssembler::new(SlideLayout::default(), "x.pptx")
            .with_title(Some("Q&A <draft>".into()))
            .assemble(&[page])
            .unwrap();
        let core = read_str(&artifact.bytes, "docProps/core.xml");
        assert!(core.contains("<dc:title>Q&amp;A &lt;draft&gt;</dc:title>"));
    }
}
