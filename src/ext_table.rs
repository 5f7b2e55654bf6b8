//! The fixed, versioned filename-extension table.
//!
//! Every file gets a 1-based `ext_index` into this list (0 means
//! "unknown"), matched case-insensitively. The table is ordered by media
//! kind so that files of a similar type sort adjacent to each other when a
//! unit is built in `(ext_index, base_name, name)` order, and so that a
//! single contiguous tail group represents executables: any extension at
//! or after [`EXE_GROUP`] is treated as an executable for BCJ and
//! solid-by-extension purposes.
//!
//! This table must never be regenerated from a live system extension list;
//! it is a fixed snapshot, extended only by adding entries at the end of
//! their media-kind group across releases.
#[rustfmt::skip]
const EXTENSIONS: &[&str] = &[
    "chm", "hxi", "hxs", "gif", "jpeg", "jpg", "jp2", "png", "tiff", "bmp",
    "ico", "psd", "psp", "awg", "ps", "eps", "cgm", "dxf", "svg", "vrml",
    "wmf", "emf", "ai", "md", "cad", "dwg", "pps", "key", "sxi", "max",
    "3ds", "iso", "bin", "nrg", "mdf", "img", "pdi", "tar", "cpio", "xpi",
    "vfd", "vhd", "vud", "vmc", "vsv", "vmdk", "dsk", "nvram", "vmem", "vmsd",
    "vmsn", "vmss", "vmtm", "inl", "inc", "idl", "acf", "asa", "h", "hpp",
    "hxx", "c", "cpp", "cxx", "m", "mm", "go", "swift", "rc", "java",
    "cs", "rs", "pas", "bas", "vb", "cls", "ctl", "frm", "dlg", "def",
    "f77", "f", "f90", "f95", "asm", "s", "sql", "manifest", "dep", "mak",
    "clw", "csproj", "vcproj", "sln", "dsp", "dsw", "class", "bat", "cmd", "bash",
    "sh", "xml", "xsd", "xsl", "xslt", "hxk", "hxc", "htm", "html", "xhtml",
    "xht", "mht", "mhtml", "htw", "asp", "aspx", "css", "cgi", "jsp", "shtml",
    "awk", "sed", "hta", "js", "json", "php", "php3", "php4", "php5", "phptml",
    "pl", "pm", "py", "pyo", "rb", "tcl", "ts", "vbs", "text", "txt",
    "tex", "ans", "asc", "srt", "reg", "ini", "doc", "docx", "mcw", "dot",
    "rtf", "hlp", "xls", "xlr", "xlt", "xlw", "ppt", "pdf", "sxc", "sxd",
    "sxi", "sxg", "sxw", "stc", "sti", "stw", "stm", "odt", "ott", "odg",
    "otg", "odp", "otp", "ods", "ots", "odf", "abw", "afp", "cwk", "lwp",
    "wpd", "wps", "wpt", "wrf", "wri", "abf", "afm", "bdf", "fon", "mgf",
    "otf", "pcf", "pfa", "snf", "ttf", "dbf", "mdb", "nsf", "ntf", "wdb",
    "db", "fdb", "gdb", "pdb", "pch", "idb", "ncb", "opt", "3gp", "avi",
    "mov", "mpeg", "mpg", "mpe", "wmv", "aac", "ape", "fla", "flac", "la",
    "mp3", "m4a", "mp4", "ofr", "ogg", "pac", "ra", "rm", "rka", "shn",
    "swa", "tta", "wv", "wma", "wav", "swf", "lzma", "7z", "xz", "ace",
    "arc", "arj", "bz", "bz2", "deb", "lzo", "lzx", "gz", "pak", "rpm",
    "sit", "tgz", "tbz", "tbz2", "tgz", "cab", "ha", "lha", "lzh", "rar",
    "zoo", "zip", "jar", "ear", "war", "msi", "obj", "lib", "tlb", "o",
    "a", "so", "exe", "dll", "ocx", "vbx", "sfx", "sys", "awx", "com",
    "out",
];

/// 1-based index of `"exe"` in [`EXTENSIONS`]; every index at or after this
/// one names an executable or executable-adjacent extension.
pub const EXE_GROUP: u32 = 273;

/// Returns the 1-based index of `ext` in the fixed extension table, or 0
/// if `ext` is not present. Matching is case-insensitive and `ext` must
/// not include the leading dot.
pub fn lookup(ext: &str) -> u32 {
    EXTENSIONS
        .iter()
        .position(|known| known.eq_ignore_ascii_case(ext))
        .map(|pos| pos as u32 + 1)
        .unwrap_or(0)
}

/// Returns whether `ext_index` names an executable extension.
pub fn is_exe_group(ext_index: u32) -> bool {
    ext_index >= EXE_GROUP
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exe_is_in_exe_group() {
        let idx = lookup("exe");
        assert_eq!(idx, EXE_GROUP);
        assert!(is_exe_group(idx));
    }

    #[test]
    fn case_insensitive_lookup() {
        assert_eq!(lookup("EXE"), lookup("exe"));
        assert_eq!(lookup("Rs"), lookup("rs"));
    }

    #[test]
    fn unknown_extension_is_zero() {
        assert_eq!(lookup("zzz_not_a_real_ext"), 0);
        assert!(!is_exe_group(0));
    }

    #[test]
    fn non_exe_extension_is_not_exe_group() {
        let idx = lookup("txt");
        assert!(idx > 0);
        assert!(!is_exe_group(idx));
    }

    #[test]
    fn dll_is_after_exe_in_exe_group() {
        let exe = lookup("exe");
        let dll = lookup("dll");
        assert!(dll > exe);
        assert!(is_exe_group(dll));
    }
}
