//! Tag constants for the attributes this library refers to by name.

use crate::header::Tag;

// file meta group
pub const FILE_META_INFORMATION_GROUP_LENGTH: Tag = Tag(0x0002, 0x0000);
pub const FILE_META_INFORMATION_VERSION: Tag = Tag(0x0002, 0x0001);
pub const MEDIA_STORAGE_SOP_CLASS_UID: Tag = Tag(0x0002, 0x0002);
pub const MEDIA_STORAGE_SOP_INSTANCE_UID: Tag = Tag(0x0002, 0x0003);
pub const TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);
pub const IMPLEMENTATION_CLASS_UID: Tag = Tag(0x0002, 0x0012);
pub const IMPLEMENTATION_VERSION_NAME: Tag = Tag(0x0002, 0x0013);
pub const SOURCE_APPLICATION_ENTITY_TITLE: Tag = Tag(0x0002, 0x0016);
pub const PRIVATE_INFORMATION_CREATOR_UID: Tag = Tag(0x0002, 0x0100);
pub const PRIVATE_INFORMATION: Tag = Tag(0x0002, 0x0102);

// media storage directory
pub const FILE_SET_ID: Tag = Tag(0x0004, 0x1130);
pub const DIRECTORY_RECORD_SEQUENCE: Tag = Tag(0x0004, 0x1220);
pub const OFFSET_OF_THE_NEXT_DIRECTORY_RECORD: Tag = Tag(0x0004, 0x1400);
pub const RECORD_IN_USE_FLAG: Tag = Tag(0x0004, 0x1410);
pub const OFFSET_OF_REFERENCED_LOWER_LEVEL_DIRECTORY_ENTITY: Tag = Tag(0x0004, 0x1420);
pub const DIRECTORY_RECORD_TYPE: Tag = Tag(0x0004, 0x1430);
pub const REFERENCED_FILE_ID: Tag = Tag(0x0004, 0x1500);
pub const REFERENCED_SOP_CLASS_UID_IN_FILE: Tag = Tag(0x0004, 0x1510);
pub const REFERENCED_SOP_INSTANCE_UID_IN_FILE: Tag = Tag(0x0004, 0x1511);
pub const REFERENCED_TRANSFER_SYNTAX_UID_IN_FILE: Tag = Tag(0x0004, 0x1512);

// identification
pub const SPECIFIC_CHARACTER_SET: Tag = Tag(0x0008, 0x0005);
pub const IMAGE_TYPE: Tag = Tag(0x0008, 0x0008);
pub const INSTANCE_CREATION_DATE: Tag = Tag(0x0008, 0x0012);
pub const INSTANCE_CREATION_TIME: Tag = Tag(0x0008, 0x0013);
pub const SOP_CLASS_UID: Tag = Tag(0x0008, 0x0016);
pub const SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x0018);
pub const STUDY_DATE: Tag = Tag(0x0008, 0x0020);
pub const SERIES_DATE: Tag = Tag(0x0008, 0x0021);
pub const ACQUISITION_DATE: Tag = Tag(0x0008, 0x0022);
pub const CONTENT_DATE: Tag = Tag(0x0008, 0x0023);
pub const STUDY_TIME: Tag = Tag(0x0008, 0x0030);
pub const SERIES_TIME: Tag = Tag(0x0008, 0x0031);
pub const ACQUISITION_TIME: Tag = Tag(0x0008, 0x0032);
pub const CONTENT_TIME: Tag = Tag(0x0008, 0x0033);
pub const ACCESSION_NUMBER: Tag = Tag(0x0008, 0x0050);
pub const MODALITY: Tag = Tag(0x0008, 0x0060);
pub const CONVERSION_TYPE: Tag = Tag(0x0008, 0x0064);
pub const MANUFACTURER: Tag = Tag(0x0008, 0x0070);
pub const INSTITUTION_NAME: Tag = Tag(0x0008, 0x0080);
pub const INSTITUTION_ADDRESS: Tag = Tag(0x0008, 0x0081);
pub const REFERRING_PHYSICIAN_NAME: Tag = Tag(0x0008, 0x0090);
pub const CODE_VALUE: Tag = Tag(0x0008, 0x0100);
pub const CODING_SCHEME_DESIGNATOR: Tag = Tag(0x0008, 0x0102);
pub const CODE_MEANING: Tag = Tag(0x0008, 0x0104);
pub const STATION_NAME: Tag = Tag(0x0008, 0x1010);
pub const STUDY_DESCRIPTION: Tag = Tag(0x0008, 0x1030);
pub const SERIES_DESCRIPTION: Tag = Tag(0x0008, 0x103E);
pub const INSTITUTIONAL_DEPARTMENT_NAME: Tag = Tag(0x0008, 0x1040);
pub const PERFORMING_PHYSICIAN_NAME: Tag = Tag(0x0008, 0x1050);
pub const OPERATORS_NAME: Tag = Tag(0x0008, 0x1070);
pub const MANUFACTURER_MODEL_NAME: Tag = Tag(0x0008, 0x1090);
pub const REFERENCED_SOP_CLASS_UID: Tag = Tag(0x0008, 0x1150);
pub const REFERENCED_SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x1155);

// patient
pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
pub const ISSUER_OF_PATIENT_ID: Tag = Tag(0x0010, 0x0021);
pub const PATIENT_BIRTH_DATE: Tag = Tag(0x0010, 0x0030);
pub const PATIENT_BIRTH_TIME: Tag = Tag(0x0010, 0x0032);
pub const PATIENT_SEX: Tag = Tag(0x0010, 0x0040);
pub const OTHER_PATIENT_IDS: Tag = Tag(0x0010, 0x1000);
pub const PATIENT_AGE: Tag = Tag(0x0010, 0x1010);
pub const PATIENT_SIZE: Tag = Tag(0x0010, 0x1020);
pub const PATIENT_WEIGHT: Tag = Tag(0x0010, 0x1030);
pub const ETHNIC_GROUP: Tag = Tag(0x0010, 0x2160);
pub const PATIENT_COMMENTS: Tag = Tag(0x0010, 0x4000);

// acquisition
pub const BODY_PART_EXAMINED: Tag = Tag(0x0018, 0x0015);
pub const SCANNING_SEQUENCE: Tag = Tag(0x0018, 0x0020);
pub const SLICE_THICKNESS: Tag = Tag(0x0018, 0x0050);
pub const KVP: Tag = Tag(0x0018, 0x0060);
pub const DEVICE_SERIAL_NUMBER: Tag = Tag(0x0018, 0x1000);
pub const SOFTWARE_VERSIONS: Tag = Tag(0x0018, 0x1020);
pub const PROTOCOL_NAME: Tag = Tag(0x0018, 0x1030);
pub const EXPOSURE_TIME: Tag = Tag(0x0018, 0x1150);
pub const X_RAY_TUBE_CURRENT: Tag = Tag(0x0018, 0x1151);

// relationship
pub const STUDY_INSTANCE_UID: Tag = Tag(0x0020, 0x000D);
pub const SERIES_INSTANCE_UID: Tag = Tag(0x0020, 0x000E);
pub const STUDY_ID: Tag = Tag(0x0020, 0x0010);
pub const SERIES_NUMBER: Tag = Tag(0x0020, 0x0011);
pub const ACQUISITION_NUMBER: Tag = Tag(0x0020, 0x0012);
pub const INSTANCE_NUMBER: Tag = Tag(0x0020, 0x0013);
pub const PATIENT_ORIENTATION: Tag = Tag(0x0020, 0x0020);
pub const IMAGE_POSITION_PATIENT: Tag = Tag(0x0020, 0x0032);
pub const IMAGE_ORIENTATION_PATIENT: Tag = Tag(0x0020, 0x0037);
pub const FRAME_OF_REFERENCE_UID: Tag = Tag(0x0020, 0x0052);
pub const SLICE_LOCATION: Tag = Tag(0x0020, 0x1041);

// image pixel description
pub const SAMPLES_PER_PIXEL: Tag = Tag(0x0028, 0x0002);
pub const PHOTOMETRIC_INTERPRETATION: Tag = Tag(0x0028, 0x0004);
pub const PLANAR_CONFIGURATION: Tag = Tag(0x0028, 0x0006);
pub const NUMBER_OF_FRAMES: Tag = Tag(0x0028, 0x0008);
pub const ROWS: Tag = Tag(0x0028, 0x0010);
pub const COLUMNS: Tag = Tag(0x0028, 0x0011);
pub const PIXEL_SPACING: Tag = Tag(0x0028, 0x0030);
pub const BITS_ALLOCATED: Tag = Tag(0x0028, 0x0100);
pub const BITS_STORED: Tag = Tag(0x0028, 0x0101);
pub const HIGH_BIT: Tag = Tag(0x0028, 0x0102);
pub const PIXEL_REPRESENTATION: Tag = Tag(0x0028, 0x0103);
pub const SMALLEST_IMAGE_PIXEL_VALUE: Tag = Tag(0x0028, 0x0106);
pub const LARGEST_IMAGE_PIXEL_VALUE: Tag = Tag(0x0028, 0x0107);
pub const WINDOW_CENTER: Tag = Tag(0x0028, 0x1050);
pub const WINDOW_WIDTH: Tag = Tag(0x0028, 0x1051);
pub const RESCALE_INTERCEPT: Tag = Tag(0x0028, 0x1052);
pub const RESCALE_SLOPE: Tag = Tag(0x0028, 0x1053);
pub const RESCALE_TYPE: Tag = Tag(0x0028, 0x1054);

// structured reporting
pub const VALUE_TYPE: Tag = Tag(0x0040, 0xA040);
pub const CONCEPT_NAME_CODE_SEQUENCE: Tag = Tag(0x0040, 0xA043);
pub const TEXT_VALUE: Tag = Tag(0x0040, 0xA160);
pub const CONTENT_SEQUENCE: Tag = Tag(0x0040, 0xA730);

// presentation state
pub const PRESENTATION_LUT_SHAPE: Tag = Tag(0x2050, 0x0020);

// pixel data and trailers
pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);
pub const DATA_SET_TRAILING_PADDING: Tag = Tag(0xFFFC, 0xFFFC);

// item pseudo-elements
pub const ITEM: Tag = Tag(0xFFFE, 0xE000);
pub const ITEM_DELIMITATION_ITEM: Tag = Tag(0xFFFE, 0xE00D);
pub const SEQUENCE_DELIMITATION_ITEM: Tag = Tag(0xFFFE, 0xE0DD);
